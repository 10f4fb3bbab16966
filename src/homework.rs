use serde_json::Value;
use tracing::error;

use crate::error::{PollError, PollResult};

const HOMEWORKS: &str = "homeworks";
const HOMEWORK_NAME: &str = "homework_name";
const STATUS: &str = "status";

/// Review states the API reports for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeworkStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl HomeworkStatus {
    pub const ALL: [HomeworkStatus; 3] = [
        HomeworkStatus::Approved,
        HomeworkStatus::Reviewing,
        HomeworkStatus::Rejected,
    ];

    pub fn code(self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "approved",
            HomeworkStatus::Reviewing => "reviewing",
            HomeworkStatus::Rejected => "rejected",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    pub fn verdict(self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "The work has been reviewed: the reviewer liked everything. Hooray!",
            HomeworkStatus::Reviewing => "The work has been taken for review.",
            HomeworkStatus::Rejected => "The work has been reviewed: the reviewer has comments.",
        }
    }
}

/// Check the envelope of an API answer and return its `homeworks` list untouched.
///
/// Records inside the list are not inspected here.
pub fn check_response(response: &Value) -> PollResult<&[Value]> {
    let object = response.as_object().ok_or(PollError::NotAnObject)?;

    let homeworks = object.get(HOMEWORKS).ok_or_else(|| {
        error!("API response has no '{}' key", HOMEWORKS);
        PollError::MissingKey(HOMEWORKS)
    })?;

    match homeworks.as_array() {
        Some(list) => Ok(list),
        None => {
            error!("'{}' in API response is not a list", HOMEWORKS);
            Err(PollError::NotAList)
        }
    }
}

/// Build the notification text for a single homework record.
pub fn parse_status(homework: &Value) -> PollResult<String> {
    for key in [HOMEWORK_NAME, STATUS] {
        if homework.get(key).is_none() {
            return Err(PollError::MissingKey(key));
        }
    }

    let status_value = &homework[STATUS];
    let status = status_value
        .as_str()
        .and_then(HomeworkStatus::from_code)
        .ok_or_else(|| {
            let code = status_value
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| status_value.to_string());
            PollError::UnknownStatus(code)
        })?;

    let name = match &homework[HOMEWORK_NAME] {
        Value::Null => {
            error!("API response has no '{}' value", HOMEWORK_NAME);
            return Err(PollError::MissingKey(HOMEWORK_NAME));
        }
        Value::String(name) => name.clone(),
        other => other.to_string(),
    };

    Ok(format!(
        "Changed review status for \"{}\". {}",
        name,
        status.verdict()
    ))
}

/// The single record reported per cycle: the first one in the list, if any.
pub fn latest(homeworks: &[Value]) -> Option<&Value> {
    homeworks.first()
}
