//! Helpers for multi-statement SurrealQL transactions.
//!
//! Transaction scripts abort with `THROW "pitch:<code>"`, optionally
//! followed by `:<detail>` (an id or a status). When a transaction is
//! cancelled every statement in it reports an error, so the thrown code
//! has to be searched for across all of them.

use pitch_core::error::PitchError;
use surrealdb::IndexedResults as Response;

use crate::error::{DbError, is_conflict};

const THROW_PREFIX: &str = "pitch:";

/// Gate for every write to a campaign's content. Expects
/// `$target_campaign` to hold the campaign id.
///
/// The project must not be archived and the campaign must be DRAFT.
/// The guard then bumps the campaign's `revision`, so the write shares a
/// key with any publish, switch or archive of the same campaign and the
/// two cannot both commit on stale reads.
const DRAFT_GUARD: &str = "\
LET $campaign = (SELECT project_id, campaign_status FROM type::record('campaign', $target_campaign))[0];
IF $campaign = NONE {
    THROW string::concat('pitch:campaign_not_found:', $target_campaign)
};
LET $archived = (SELECT VALUE is_archived FROM type::record('project', $campaign.project_id))[0];
IF $archived = true {
    THROW string::concat('pitch:archived:', $campaign.project_id)
};
IF $campaign.campaign_status != 'DRAFT' {
    THROW string::concat('pitch:not_draft:', $campaign.campaign_status)
};
UPDATE type::record('campaign', $target_campaign) SET revision += 1;
";

/// Wrap a content write in a transaction behind [`DRAFT_GUARD`].
///
/// `resolve` runs first and must `LET $target_campaign`; `body` runs
/// only once the guard has passed.
pub(crate) fn guarded_script(resolve: &str, body: &str) -> String {
    format!("BEGIN TRANSACTION;\n{resolve}\n{DRAFT_GUARD}{body}\nCOMMIT TRANSACTION;\n")
}

/// Pass the response through, or return the messages of every failed
/// statement in statement order.
pub(crate) fn failed_statements(mut response: Response) -> Result<Response, Vec<String>> {
    let errors = response.take_errors();
    if errors.is_empty() {
        return Ok(response);
    }
    let mut indexed: Vec<(usize, String)> = errors
        .into_iter()
        .map(|(idx, err)| (idx, err.to_string()))
        .collect();
    indexed.sort_by_key(|(idx, _)| *idx);
    Err(indexed.into_iter().map(|(_, msg)| msg).collect())
}

/// Code of the first `pitch:<code>` marker found in `messages`.
pub(crate) fn thrown_code(messages: &[String]) -> Option<String> {
    messages.iter().find_map(|msg| {
        let start = msg.find(THROW_PREFIX)? + THROW_PREFIX.len();
        let code: String = msg[start..]
            .chars()
            .take_while(|c| c.is_ascii_lowercase() || *c == '_')
            .collect();
        (!code.is_empty()).then_some(code)
    })
}

/// The `:<detail>` that follows the first thrown code, if any.
pub(crate) fn thrown_detail(messages: &[String]) -> Option<String> {
    messages.iter().find_map(|msg| {
        let start = msg.find(THROW_PREFIX)? + THROW_PREFIX.len();
        let rest = &msg[start..];
        let code_len = rest
            .find(|c: char| !(c.is_ascii_lowercase() || c == '_'))
            .unwrap_or(rest.len());
        let detail: String = rest[code_len..]
            .strip_prefix(':')?
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        (!detail.is_empty()).then_some(detail)
    })
}

/// Map a failed content write to a domain error.
///
/// Codes thrown by [`DRAFT_GUARD`] are handled here; `specific` maps
/// the codes of the surrounding script. Anything else goes through
/// [`unthrown_failure`].
pub(crate) fn content_write_error(
    entity: &str,
    messages: Vec<String>,
    specific: impl FnOnce(&str) -> Option<PitchError>,
) -> PitchError {
    let Some(code) = thrown_code(&messages) else {
        return unthrown_failure(entity, messages).into();
    };
    let detail = thrown_detail(&messages).unwrap_or_default();
    match code.as_str() {
        "campaign_not_found" => PitchError::not_found("campaign", detail),
        "archived" => PitchError::Archived { project_id: detail },
        "not_draft" => PitchError::invalid_state(format!(
            "campaign is {detail}; only DRAFT campaigns can be edited"
        )),
        other => specific(other)
            .unwrap_or_else(|| PitchError::Internal(format!("unexpected {entity} code {other}"))),
    }
}

/// Fallback classification for failures that carry no thrown code.
pub(crate) fn unthrown_failure(entity: &str, messages: Vec<String>) -> DbError {
    if let Some(conflict) = messages
        .iter()
        .find(|m| is_conflict(&m.to_lowercase()))
    {
        return DbError::Conflict(conflict.clone());
    }
    let joined = messages.join("; ");
    DbError::from_statement(entity, joined)
}
