/// Display loops for a capture session
///
/// Manual mode only paces the display. Auto mode additionally tells the
/// capture device which row is on screen and waits for it to confirm the
/// photo before moving on. At most one request is in flight at any time.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use super::protocol::Request;
use super::session::{Phase, SessionState, Step};
use super::transport::Transport;
use crate::codec::{self, NonceSource};
use crate::dataset::DatasetRow;
use crate::display::{ImageDisplay, OperatorSignal, Pacing, ScreenGeometry};
use crate::{Error, Result};

/// Pause after showing an image in auto mode, before the request is sent.
/// The operator can cancel during this window.
pub const AUTO_SETTLE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Manual,
    Auto,
}

/// How a session that did not abort ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOutcome {
    /// Every row was processed
    Completed,
    /// The operator stopped the session
    Cancelled,
}

/// A row the device confirmed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturedPhoto {
    pub sequence: u64,
    /// Filename sent to the device
    pub requested: String,
    /// Filename the device reported saving
    pub saved: String,
    /// Attempts including timed-out ones
    pub attempts: u32,
}

/// A row dropped after a tolerated device error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub sequence: u64,
    pub filename: String,
    pub message: String,
}

/// Summary of one session
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub mode: SessionMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: SessionOutcome,
    /// Images put on screen
    pub shown: usize,
    /// Rows fully processed (accepted or skipped)
    pub processed: u64,
    pub accepted: Vec<CapturedPhoto>,
    pub skipped: Vec<SkippedRow>,
    /// Resends caused by timeouts
    pub retries: u64,
}

impl SessionReport {
    fn start(mode: SessionMode) -> Self {
        let now = Utc::now();
        Self {
            mode,
            started_at: now,
            finished_at: now,
            outcome: SessionOutcome::Completed,
            shown: 0,
            processed: 0,
            accepted: Vec::new(),
            skipped: Vec::new(),
            retries: 0,
        }
    }

    fn finish(mut self, outcome: SessionOutcome) -> Self {
        self.outcome = outcome;
        self.finished_at = Utc::now();
        self
    }
}

/// Show every row, advancing on operator input or after a fixed delay
pub fn run_manual<D>(
    rows: &[DatasetRow],
    display: &mut D,
    geometry: ScreenGeometry,
    pacing: Pacing,
) -> Result<SessionReport>
where
    D: ImageDisplay + ?Sized,
{
    let mut report = SessionReport::start(SessionMode::Manual);

    for row in rows {
        display.show(row, geometry)?;
        report.shown += 1;

        if display.wait(pacing) == OperatorSignal::Cancel {
            tracing::info!(sequence = row.sequence, "session cancelled by operator");
            return Ok(report.finish(SessionOutcome::Cancelled));
        }
        report.processed += 1;
    }

    Ok(report.finish(SessionOutcome::Completed))
}

/// Show every row and synchronise each one with the capture device
///
/// # Errors
/// * `SessionAborted` - the device reported two errors in a row
/// * display, encoding and socket failures are passed through
pub fn run_auto<D, T, N>(
    rows: &[DatasetRow],
    display: &mut D,
    geometry: ScreenGeometry,
    transport: &mut T,
    nonces: &mut N,
) -> Result<SessionReport>
where
    D: ImageDisplay + ?Sized,
    T: Transport + ?Sized,
    N: NonceSource + ?Sized,
{
    // One request per row, built before the first image is shown.
    // Retries resend it unchanged.
    let requests = rows
        .iter()
        .map(|row| {
            codec::encode_with(row.sequence, &row.original_path, nonces)
                .map(|filename| Request::new(row.sequence, filename))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut report = SessionReport::start(SessionMode::Auto);
    let mut state = SessionState::new();

    for (row, request) in rows.iter().zip(requests) {
        tracing::debug!(phase = %Phase::Display, sequence = row.sequence);
        display.show(row, geometry)?;
        report.shown += 1;

        if display.wait(Pacing::Delay(AUTO_SETTLE)) == OperatorSignal::Cancel {
            tracing::info!(sequence = row.sequence, "session cancelled by operator");
            return Ok(report.finish(SessionOutcome::Cancelled));
        }

        let mut attempts = 0u32;
        loop {
            tracing::debug!(phase = %Phase::AwaitReply, sequence = row.sequence, attempt = attempts + 1);
            attempts += 1;
            let reply = transport.exchange(&request)?;
            let (next, step) = state.on_reply(&reply);
            state = next;

            match step {
                Step::Accept(saved) => {
                    tracing::info!(sequence = row.sequence, photo = %saved, "wrote photo");
                    report.accepted.push(CapturedPhoto {
                        sequence: row.sequence,
                        requested: request.filename.clone(),
                        saved,
                        attempts,
                    });
                    break;
                }
                Step::Retry => {
                    report.retries += 1;
                    tracing::warn!(sequence = row.sequence, attempts, "timeout, trying again");
                }
                Step::Skip(message) => {
                    tracing::warn!(
                        sequence = row.sequence,
                        %message,
                        "device error, will try with next photo"
                    );
                    report.skipped.push(SkippedRow {
                        sequence: row.sequence,
                        filename: request.filename.clone(),
                        message,
                    });
                    break;
                }
                Step::Abort(message) => {
                    tracing::error!(phase = %Phase::Aborted, sequence = row.sequence, %message, "stopping transfer loop");
                    return Err(Error::SessionAborted {
                        sequence: row.sequence,
                        message,
                    });
                }
            }
        }

        tracing::debug!(phase = %Phase::Advance, sequence = row.sequence);
        state = state.advance();
        report.processed = state.sequence_cursor;
    }

    tracing::debug!(phase = %Phase::Done, processed = state.sequence_cursor);
    Ok(report.finish(SessionOutcome::Completed))
}
