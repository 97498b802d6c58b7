//! Player resources and run settings.

use poly_defence_core::{
    CommandError, Difficulty, EconomySnapshot, HARDCORE_HEALTH, STARTING_HEALTH, STARTING_MONEY,
};

/// Health, money, wave counter and the settings that are locked once a run starts.
#[derive(Debug)]
pub(crate) struct Economy {
    health: i32,
    money: u32,
    wave: u32,
    hardcore: bool,
    difficulty: Difficulty,
    game_over: bool,
}

impl Economy {
    /// Creates the starting economy for a regular run on easy difficulty.
    pub(crate) fn new() -> Self {
        Self {
            health: STARTING_HEALTH,
            money: STARTING_MONEY,
            wave: 0,
            hardcore: false,
            difficulty: Difficulty::default(),
            game_over: false,
        }
    }

    /// Restores health, money and the wave counter while keeping the run settings.
    pub(crate) fn reset(&mut self) {
        self.health = self.starting_health();
        self.money = STARTING_MONEY;
        self.wave = 0;
        self.game_over = false;
    }

    pub(crate) fn health(&self) -> i32 {
        self.health
    }

    pub(crate) fn money(&self) -> u32 {
        self.money
    }

    pub(crate) fn wave(&self) -> u32 {
        self.wave
    }

    pub(crate) fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub(crate) fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Reports whether the first wave has been started since the last reset.
    pub(crate) fn run_started(&self) -> bool {
        self.wave > 0
    }

    /// Withdraws `amount`, refusing when the balance cannot cover it.
    pub(crate) fn debit(&mut self, amount: u32) -> Result<(), CommandError> {
        if self.money < amount {
            return Err(CommandError::InsufficientFunds {
                required: amount,
                available: self.money,
            });
        }
        self.money -= amount;
        Ok(())
    }

    pub(crate) fn credit(&mut self, amount: u32) {
        self.money = self.money.saturating_add(amount);
    }

    /// Subtracts health and returns `true` when this loss ended the run.
    pub(crate) fn damage(&mut self, amount: i32) -> bool {
        self.health = self.health.saturating_sub(amount);
        if self.health <= 0 && !self.game_over {
            self.game_over = true;
            return true;
        }
        false
    }

    /// Increments the wave counter and returns the new wave number.
    pub(crate) fn advance_wave(&mut self) -> u32 {
        self.wave = self.wave.saturating_add(1);
        self.wave
    }

    pub(crate) fn set_difficulty(&mut self, difficulty: Difficulty) -> Result<(), CommandError> {
        if self.run_started() {
            return Err(CommandError::RunInProgress);
        }
        self.difficulty = difficulty;
        Ok(())
    }

    /// Flips hardcore mode and restores the matching starting health.
    pub(crate) fn toggle_hardcore(&mut self) -> Result<bool, CommandError> {
        if self.run_started() {
            return Err(CommandError::RunInProgress);
        }
        self.hardcore = !self.hardcore;
        self.health = self.starting_health();
        Ok(self.hardcore)
    }

    pub(crate) fn snapshot(&self) -> EconomySnapshot {
        EconomySnapshot {
            health: self.health,
            money: self.money,
            wave: self.wave,
            hardcore: self.hardcore,
            difficulty: self.difficulty,
            game_over: self.game_over,
        }
    }

    fn starting_health(&self) -> i32 {
        if self.hardcore {
            HARDCORE_HEALTH
        } else {
            STARTING_HEALTH
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_refuses_overdraft_without_changing_balance() {
        let mut economy = Economy::new();
        assert_eq!(
            economy.debit(25),
            Err(CommandError::InsufficientFunds {
                required: 25,
                available: 20,
            })
        );
        assert_eq!(economy.money(), 20);
        assert_eq!(economy.debit(20), Ok(()));
        assert_eq!(economy.money(), 0);
    }

    #[test]
    fn damage_reports_game_over_once() {
        let mut economy = Economy::new();
        assert!(!economy.damage(9));
        assert!(economy.damage(1));
        assert!(!economy.damage(1));
        assert_eq!(economy.health(), -1);
        assert!(economy.is_game_over());
    }

    #[test]
    fn hardcore_toggle_swaps_starting_health() {
        let mut economy = Economy::new();
        assert_eq!(economy.toggle_hardcore(), Ok(true));
        assert_eq!(economy.health(), HARDCORE_HEALTH);
        assert_eq!(economy.toggle_hardcore(), Ok(false));
        assert_eq!(economy.health(), STARTING_HEALTH);
    }

    #[test]
    fn settings_lock_after_first_wave_and_unlock_on_reset() {
        let mut economy = Economy::new();
        assert_eq!(economy.toggle_hardcore(), Ok(true));
        assert_eq!(economy.advance_wave(), 1);
        assert_eq!(
            economy.set_difficulty(Difficulty::Hard),
            Err(CommandError::RunInProgress)
        );
        assert_eq!(economy.toggle_hardcore(), Err(CommandError::RunInProgress));

        economy.reset();
        assert_eq!(economy.health(), HARDCORE_HEALTH);
        assert_eq!(economy.wave(), 0);
        assert_eq!(economy.set_difficulty(Difficulty::Hard), Ok(()));
        assert_eq!(economy.difficulty(), Difficulty::Hard);
    }
}
