//! Nestable named logs for tracing how a permission decision was reached.
//!
//! A [`LogStore`] keeps two collections:
//!
//! - **active** logs, used as a stack: the most recently started log is the
//!   *current* one and receives every [`log`](Loggable::log) call. Ending it
//!   makes the previously started log current again.
//! - **finished** logs, ordered by when they were finished. Finishing a name
//!   that was already finished before moves it to the end, so
//!   [`get_last_log`](Loggable::get_last_log) always reports the latest run.
//!
//! ```ignore
//! user.start_log("outer")?;
//! user.log(["first"])?;
//! user.start_log("inner")?;
//! user.log(["nested"])?;
//! user.end_log()?;            // "outer" is current again
//! user.log(["second"])?;
//! user.end_log()?;
//! assert_eq!(user.get_log("outer")?, "first\nsecond");
//! ```

use std::cell::RefCell;

use crate::error::LogError;

#[derive(Debug, Clone)]
struct NamedLog {
    name: String,
    lines: Vec<String>,
}

/// Storage behind [`Loggable`].
#[derive(Debug, Default)]
pub struct LogStore {
    active: Vec<NamedLog>,
    finished: Vec<NamedLog>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, name: &str) -> Result<(), LogError> {
        if self.active.iter().any(|l| l.name == name) {
            return Err(LogError::AlreadyActive(name.to_string()));
        }
        self.active.push(NamedLog {
            name: name.to_string(),
            lines: Vec::new(),
        });
        Ok(())
    }

    pub fn append<I, S>(&mut self, lines: I) -> Result<(), LogError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let current = self.active.last_mut().ok_or(LogError::NoActiveLog)?;
        current.lines.extend(lines.into_iter().map(Into::into));
        Ok(())
    }

    pub fn end(&mut self) -> Result<(String, Vec<String>), LogError> {
        let log = self.active.pop().ok_or(LogError::NoActiveLog)?;
        let result = (log.name.clone(), log.lines.clone());
        self.finished.retain(|l| l.name != log.name);
        self.finished.push(log);
        Ok(result)
    }

    pub fn discard(&mut self) -> Result<(), LogError> {
        self.active.pop().map(|_| ()).ok_or(LogError::NoActiveLog)
    }

    pub fn get(&self, name: &str) -> Result<&[String], LogError> {
        self.finished
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.lines.as_slice())
            .ok_or_else(|| LogError::NotFound(name.to_string()))
    }

    pub fn last(&self) -> Result<(&str, &[String]), LogError> {
        self.finished
            .last()
            .map(|l| (l.name.as_str(), l.lines.as_slice()))
            .ok_or(LogError::NoneFinished)
    }

    pub fn current_name(&self) -> Option<&str> {
        self.active.last().map(|l| l.name.as_str())
    }

    /// Whether `name` is anywhere on the active stack.
    pub fn is_active(&self, name: &str) -> bool {
        self.active.iter().any(|l| l.name == name)
    }

    /// Replace the first line of the current log equal to `placeholder`.
    ///
    /// Returns whether a replacement happened.
    pub(crate) fn replace_line(&mut self, placeholder: &str, line: String) -> bool {
        let Some(current) = self.active.last_mut() else {
            return false;
        };
        match current.lines.iter_mut().find(|l| l.as_str() == placeholder) {
            Some(slot) => {
                *slot = line;
                true
            }
            None => false,
        }
    }

    /// Drop every active and finished log.
    pub fn clear(&mut self) {
        self.active.clear();
        self.finished.clear();
    }
}

/// A named-log recorder that can be attached to any entity.
///
/// Implementors only provide access to their [`LogStore`]; every operation is
/// provided. The store lives behind a `RefCell`, so logging works through a
/// shared reference, including from inside an access check that only
/// receives `&user`.
pub trait Loggable {
    fn log_store(&self) -> &RefCell<LogStore>;

    /// Begin a new named log. It becomes the current log.
    fn start_log(&self, name: &str) -> Result<(), LogError> {
        self.log_store().borrow_mut().start(name)
    }

    /// Append lines to the current log.
    fn log<I, S>(&self, lines: I) -> Result<(), LogError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        Self: Sized,
    {
        self.log_store().borrow_mut().append(lines)
    }

    /// Finish the current log, returning its name and a copy of its lines.
    fn end_log(&self) -> Result<(String, Vec<String>), LogError> {
        self.log_store().borrow_mut().end()
    }

    /// Drop the current log without finishing it.
    fn discard_log(&self) -> Result<(), LogError> {
        self.log_store().borrow_mut().discard()
    }

    /// A finished log, joined by newlines.
    fn get_log(&self, name: &str) -> Result<String, LogError> {
        self.log_store().borrow().get(name).map(|lines| lines.join("\n"))
    }

    /// A finished log as a copy of its lines.
    fn get_log_raw(&self, name: &str) -> Result<Vec<String>, LogError> {
        self.log_store().borrow().get(name).map(|lines| lines.to_vec())
    }

    /// The most recently finished log, joined by newlines.
    fn get_last_log(&self) -> Result<String, LogError> {
        self.log_store()
            .borrow()
            .last()
            .map(|(_, lines)| lines.join("\n"))
    }

    fn get_last_log_raw(&self) -> Result<Vec<String>, LogError> {
        self.log_store()
            .borrow()
            .last()
            .map(|(_, lines)| lines.to_vec())
    }

    fn has_active_log(&self) -> bool {
        self.log_store().borrow().current_name().is_some()
    }

    fn active_log_name(&self) -> Option<String> {
        self.log_store().borrow().current_name().map(str::to_string)
    }
}
