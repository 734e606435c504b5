use std::time::Duration;

pub const LOGIN_ROUTE: &str = "/login";
pub const HOME_ROUTE: &str = "/";

/// What a view may do to its surroundings: move to another route or pop an
/// alert.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
    fn alert(&self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub route: String,
    pub delay: Duration,
}

impl Redirect {
    pub fn now(route: &str) -> Self {
        Self::after(route, Duration::ZERO)
    }

    pub fn after(route: &str, delay: Duration) -> Self {
        Self {
            route: route.to_string(),
            delay,
        }
    }

    /// Wait out the delay, then navigate.
    pub async fn follow(&self, nav: &dyn Navigator) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        nav.navigate(&self.route);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum NavEvent {
        Navigate(String),
        Alert(String),
    }

    #[derive(Default)]
    pub struct RecordingNavigator {
        events: Mutex<Vec<NavEvent>>,
    }

    impl RecordingNavigator {
        pub fn events(&self) -> Vec<NavEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, route: &str) {
            self.events
                .lock()
                .unwrap()
                .push(NavEvent::Navigate(route.to_string()));
        }

        fn alert(&self, message: &str) {
            self.events
                .lock()
                .unwrap()
                .push(NavEvent::Alert(message.to_string()));
        }
    }
}
