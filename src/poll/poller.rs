//! The polling loop

use std::convert::Infallible;
use std::future::Future;

use tokio::time::Instant;

use super::{PollConfig, PollResult};
use crate::common::Result;

/// Probe until `predicate` holds or `config.max_wait` elapses.
///
/// The probe runs first, before any wait. A probe error or an empty
/// observation counts as "not yet"; neither stops the loop. Probes never
/// overlap: each one is awaited before the predicate runs. When
/// `max_wait` is shorter than `interval` there is exactly one probe.
///
/// ```no_run
/// # async fn example(client: booker::api::BookerClient, token: String) -> booker::Result<()> {
/// use booker::poll::{poll_until, PollConfig};
///
/// let result = poll_until(
///     || client.find_booking(&token, 1, 3),
///     |booking| booking.firstname == "Changed",
///     &PollConfig::from_secs(60, 5)?,
/// )
/// .await;
/// let booking = result.into_result()?;
/// # Ok(())
/// # }
/// ```
pub async fn poll_until<T, F, Fut, P>(
    probe: F,
    mut predicate: P,
    config: &PollConfig,
) -> PollResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
    P: FnMut(&T) -> bool,
{
    match try_poll_until(probe, |value| Ok::<_, Infallible>(predicate(value)), config).await {
        Ok(result) => result,
        Err(never) => match never {},
    }
}

/// Like [`poll_until`], with a predicate that can fail.
///
/// A predicate error is a bug in the check, not a transient state of the
/// service, so it ends polling immediately and is returned as-is.
pub async fn try_poll_until<T, E, F, Fut, P>(
    mut probe: F,
    mut predicate: P,
    config: &PollConfig,
) -> std::result::Result<PollResult<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
    P: FnMut(&T) -> std::result::Result<bool, E>,
{
    let start = Instant::now();
    let max_wait = config.max_wait();
    let mut last_observed: Option<T> = None;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        match probe().await {
            Ok(Some(value)) => {
                if predicate(&value)? {
                    tracing::debug!(
                        attempt,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Condition satisfied"
                    );
                    return Ok(PollResult::Success(value));
                }
                tracing::debug!(attempt, "Condition not yet satisfied");
                last_observed = Some(value);
            }
            Ok(None) => {
                tracing::debug!(attempt, "Probe returned nothing yet");
                last_observed = None;
            }
            Err(e) if e.is_transient() => {
                tracing::debug!(attempt, error = %e, "Transient probe failure, retrying");
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Probe failed, retrying until deadline");
            }
        }

        let elapsed = start.elapsed();
        if elapsed >= max_wait || config.single_attempt() {
            tracing::warn!(
                attempts = attempt,
                max_wait_secs = max_wait.as_secs(),
                "Condition not met before deadline"
            );
            return Ok(PollResult::Timeout {
                last_observed,
                max_wait,
            });
        }

        // Never sleep past the deadline; the last probe lands on it.
        let pause = config.interval().min(max_wait - elapsed);
        tokio::time::sleep(pause).await;
    }
}
