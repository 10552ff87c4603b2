use crate::calendar::ViewCursor;
use crate::models::{Address, Habit, WalletView};
use chrono::NaiveDate;
use tracing::info;

/// Wallet connection, view cursor and habit selection for the page.
#[derive(Debug, Clone)]
pub struct Session {
    wallet: Option<Address>,
    pub cursor: ViewCursor,
    selected_habit: Option<u64>,
}

impl Session {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            wallet: None,
            cursor: ViewCursor::containing(today),
            selected_habit: None,
        }
    }

    pub fn wallet(&self) -> Option<&Address> {
        self.wallet.as_ref()
    }

    pub fn connect(&mut self, address: Address) {
        if self.wallet.as_ref() != Some(&address) {
            self.selected_habit = None;
        }
        info!(account = %address, "wallet connected");
        self.wallet = Some(address);
    }

    pub fn disconnect(&mut self) {
        if let Some(address) = self.wallet.take() {
            info!(account = %address, "wallet disconnected");
        }
        self.selected_habit = None;
    }

    pub fn wallet_view(&self) -> WalletView {
        WalletView {
            connected: self.wallet.is_some(),
            address: self.wallet.as_ref().map(|address| address.to_string()),
            short_address: self.wallet.as_ref().map(Address::short),
        }
    }

    pub fn selected_habit(&self) -> Option<u64> {
        self.selected_habit
    }

    pub fn select(&mut self, id: u64) {
        self.selected_habit = Some(id);
    }

    /// Resolves the active habit against a fresh registry snapshot, falling
    /// back to the first habit when the selection is gone.
    pub fn active_habit<'a>(&mut self, habits: &'a [Habit]) -> Option<&'a Habit> {
        let active = self
            .selected_habit
            .and_then(|id| habits.iter().find(|habit| habit.id == id))
            .or_else(|| habits.first());
        self.selected_habit = active.map(|habit| habit.id);
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::HabitColor;

    fn habit(id: u64) -> Habit {
        Habit {
            id,
            name: format!("habit {id}"),
            color: HabitColor::Green,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn selection_falls_back_to_first_live_habit() {
        let mut session = Session::new(today());
        let habits = vec![habit(2), habit(5)];

        session.select(5);
        assert_eq!(session.active_habit(&habits).map(|h| h.id), Some(5));

        session.select(3);
        assert_eq!(session.active_habit(&habits).map(|h| h.id), Some(2));
        assert_eq!(session.selected_habit(), Some(2));

        assert!(session.active_habit(&[]).is_none());
        assert_eq!(session.selected_habit(), None);
    }

    #[test]
    fn switching_accounts_clears_the_selection() {
        let mut session = Session::new(today());
        let first = Address::parse("0x1111111111111111111111111111111111111111").unwrap();
        let second = Address::parse("0x2222222222222222222222222222222222222222").unwrap();

        session.connect(first.clone());
        session.select(4);
        session.connect(first);
        assert_eq!(session.selected_habit(), Some(4));

        session.connect(second);
        assert_eq!(session.selected_habit(), None);
        assert_eq!(session.wallet_view().short_address.as_deref(), Some("0x2222...2222"));

        session.disconnect();
        assert!(!session.wallet_view().connected);
    }
}
