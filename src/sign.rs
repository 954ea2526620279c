use chrono::{Local, NaiveDate};
use log::{error, info};
use std::time::Duration;
use tokio::time;

use crate::config::SignConfig;
use crate::util::{Gateway, NapcatClient};

/// Remembers the last calendar day the sign-in ran.
#[derive(Debug, Default)]
pub struct DailyClock {
    last_day: Option<NaiveDate>,
}

impl DailyClock {
    /// True the first time it is called on each new day.
    pub fn due(&mut self, today: NaiveDate) -> bool {
        if self.last_day == Some(today) {
            return false;
        }
        self.last_day = Some(today);
        true
    }
}

pub async fn sign_all<G: Gateway>(config: &SignConfig, client: &G) {
    for group_id in &config.groups {
        match client.send_group_sign(*group_id, config.method).await {
            Ok(()) => info!("group {} signed in", group_id),
            Err(e) => error!("group {} sign-in failed: {}", group_id, e),
        }
    }
}

pub async fn run_daily(config: SignConfig, client: NapcatClient) {
    let mut clock = DailyClock::default();
    let mut ticker = time::interval(Duration::from_secs(1));
    info!("daily sign-in enabled for {} groups", config.groups.len());
    loop {
        ticker.tick().await;
        if clock.due(Local::now().date_naive()) {
            sign_all(&config, &client).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignMethod;
    use crate::util::testing::RecordingGateway;

    #[test]
    fn fires_once_per_day() {
        let mut clock = DailyClock::default();
        let day1 = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let day2 = day1.succ_opt().unwrap();

        assert!(clock.due(day1));
        assert!(!clock.due(day1));
        assert!(!clock.due(day1));
        assert!(clock.due(day2));
        assert!(!clock.due(day2));
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_rest() {
        let config = SignConfig {
            enabled: true,
            groups: vec![1, 2, 3],
            method: SignMethod::Get,
        };
        let gateway = RecordingGateway {
            failing_sign_groups: vec![2],
            ..Default::default()
        };

        sign_all(&config, &gateway).await;

        assert_eq!(gateway.signed(), vec![1, 2, 3]);
    }
}
