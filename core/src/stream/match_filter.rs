//! stream/match_filter.rs
//! Field predicate + output cap (single-threaded stage).

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crossbeam::channel::{Receiver, Sender};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::schema::{FieldError, Message};
use crate::stream::cancel::{recv_or_cancel, send_or_cancel, Shutdown};
use crate::stream::types::{DecodedRecord, StageReport};
use crate::telemetry::Stage;
use crate::utils::split_match_expression;

#[derive(Debug, Error)]
pub enum MatchExprError {
    #[error("expected 'Field=pattern', got '{0}'")]
    MissingSeparator(String),

    #[error("field name is empty")]
    EmptyField,

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// `Field=regex` predicate over a string field.
///
/// The field may be a dotted path into nested messages.
#[derive(Debug, Clone)]
pub struct MatchExpr {
    field: String,
    pattern: Regex,
}

impl MatchExpr {
    pub fn new(field: impl Into<String>, pattern: &str) -> Result<Self, MatchExprError> {
        let field = field.into();
        if field.trim().is_empty() {
            return Err(MatchExprError::EmptyField);
        }
        let pattern = Regex::new(pattern).map_err(|source| MatchExprError::InvalidPattern {
            pattern: pattern.to_owned(),
            source,
        })?;
        Ok(Self { field, pattern })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Does the message's field match? Lookup failures are returned so the
    /// caller decides how to report them.
    pub fn matches<M: Message>(&self, msg: &M) -> Result<bool, FieldError> {
        let value = msg.string_field(&self.field)?;
        Ok(self.pattern.is_match(&value))
    }
}

impl FromStr for MatchExpr {
    type Err = MatchExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, pattern) =
            split_match_expression(s).ok_or_else(|| MatchExprError::MissingSeparator(s.to_owned()))?;
        MatchExpr::new(field.trim(), pattern)
    }
}

impl fmt::Display for MatchExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field, self.pattern.as_str())
    }
}

/// Outcome of offering one message to the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Emit,
    Skip,
    /// The cap is already reached; nothing more is admitted.
    Saturated,
}

/// Predicate + cap. Owns the match counter; never shared across threads.
#[derive(Debug)]
pub struct MatchFilter {
    expr: Option<MatchExpr>,
    max_output: Option<u64>,
    matched: u64,
    miss_reported: bool,
    report: StageReport,
}

impl MatchFilter {
    /// `max_output` of `None` or `Some(0)` means unbounded.
    pub fn new(expr: Option<MatchExpr>, max_output: Option<u64>) -> Self {
        Self {
            expr,
            max_output: max_output.filter(|m| *m > 0),
            matched: 0,
            miss_reported: false,
            report: StageReport::default(),
        }
    }

    pub fn matched(&self) -> u64 {
        self.matched
    }

    pub fn is_saturated(&self) -> bool {
        self.max_output.is_some_and(|max| self.matched >= max)
    }

    /// Decide on one message. An `Emit` verdict has already been counted.
    pub fn admit<M: Message>(&mut self, msg: &M) -> Verdict {
        if self.is_saturated() {
            return Verdict::Saturated;
        }

        let hit = match &self.expr {
            None => true,
            Some(expr) => match expr.matches(msg) {
                Ok(hit) => hit,
                Err(e) => {
                    self.report.counters.add_miss();
                    if !self.miss_reported {
                        warn!(field = expr.field(), error = %e, "can't evaluate match field, skipping record");
                        self.miss_reported = true;
                    }
                    false
                }
            },
        };

        if !hit {
            return Verdict::Skip;
        }
        self.matched += 1;
        self.report.counters.add_matched();
        Verdict::Emit
    }

    /// Run loop: consumes decoded records, forwards admitted messages.
    ///
    /// With `tx` of `None` admitted messages are only counted. Reaching the
    /// cap fires `stop` so the framer and decoder pool wind down.
    pub fn run<M: Message>(
        mut self,
        rx: Receiver<DecodedRecord<M>>,
        tx: Option<Sender<DecodedRecord<M>>>,
        shutdown: &Shutdown,
    ) -> StageReport {
        debug!(predicate = ?self.expr.as_ref().map(|e| e.to_string()), cap = ?self.max_output, "match filter started");

        while let Some(record) = recv_or_cancel(&rx, &shutdown.abort) {
            let start = Instant::now();
            let verdict = self.admit(&record.message);
            self.report.stage_times.add(Stage::Match, start.elapsed());

            match verdict {
                Verdict::Saturated => break,
                Verdict::Skip => continue,
                Verdict::Emit => {
                    if let Some(tx) = &tx {
                        if send_or_cancel(tx, record, &shutdown.abort).is_err() {
                            break;
                        }
                    }
                    if self.is_saturated() {
                        debug!(matched = self.matched, "output cap reached, stopping upstream");
                        break;
                    }
                }
            }
        }

        // Unblocks the framer and decoders however the loop ended.
        shutdown.stop.cancel();

        debug!(matched = self.matched, misses = self.report.counters.field_misses, "match filter finished");
        self.report
    }
}
