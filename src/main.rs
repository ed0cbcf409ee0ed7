use journey_sim::{
    CancelToken, Config, Journey, JourneyAttributes, JourneyError, JourneySummary, KafkaPublisher,
    MovementModel, RouteAttributes,
};
use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::process::ExitCode;

/// Exit status for a forced stop, as a shell reports SIGINT.
const EXIT_INTERRUPTED: i32 = 130;

fn run(config: Config, cancel: CancelToken) -> Result<JourneySummary, JourneyError> {
    let publisher = KafkaPublisher::connect(&config)?;
    let model = MovementModel::starting_now(&RouteAttributes::default());
    let mut journey = Journey::new(
        model,
        JourneyAttributes::from(&config),
        publisher,
        StdRng::from_entropy(),
    )
    .with_cancel_token(cancel);
    journey.run()
}

/// Cancels the journey on the first interrupt. Returns true on the second,
/// when the caller should exit at once.
async fn watch_interrupts<F, Fut>(mut interrupt: F, cancel: CancelToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(err) = interrupt().await {
        warn!("Cannot listen for Ctrl+C: {err}");
        return false;
    }
    info!("Ctrl+C received, stopping after the current tick (again to quit now)...");
    cancel.cancel();
    if interrupt().await.is_err() {
        return false;
    }
    warn!("Ctrl+C received again, exiting without waiting for deliveries");
    true
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("Unexpected error occurred: {err}");
            return ExitCode::FAILURE;
        }
    };
    info!(
        "Publishing to {} ({:?})",
        config.bootstrap_servers, config.topics
    );

    let cancel = CancelToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, watcher).await {
            std::process::exit(EXIT_INTERRUPTED);
        }
    });

    match tokio::task::spawn_blocking(move || run(config, cancel)).await {
        Ok(Ok(_)) => ExitCode::SUCCESS,
        Ok(Err(err)) => {
            error!("Unexpected error occurred: {err}");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("Unexpected error occurred: journey thread failed: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[tokio::test]
    async fn second_interrupt_forces_exit() {
        let cancel = CancelToken::new();
        let mut interrupts = 0;
        let forced = watch_interrupts(
            || {
                interrupts += 1;
                async { Ok(()) }
            },
            cancel.clone(),
        )
        .await;
        assert!(forced);
        assert!(cancel.is_cancelled());
        assert_eq!(interrupts, 2);
    }

    #[tokio::test]
    async fn first_interrupt_only_cancels() {
        let cancel = CancelToken::new();
        let mut interrupts = 0;
        let forced = watch_interrupts(
            || {
                interrupts += 1;
                let first = interrupts == 1;
                async move {
                    if first {
                        Ok(())
                    } else {
                        Err(io::Error::new(io::ErrorKind::Other, "signal stream closed"))
                    }
                }
            },
            cancel.clone(),
        )
        .await;
        assert!(!forced);
        assert!(cancel.is_cancelled());
    }
}
