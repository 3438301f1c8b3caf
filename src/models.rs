use serde::{Deserialize, Deserializer, Serialize};

pub type PerformerId = i64;
pub type JudgeId = i64;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Performer {
    pub id: PerformerId,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Judge {
    pub judge_id: JudgeId,
    pub name: String,
    /// Only present when the judge comes from the login endpoint.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
}

/// Accepts `true`/`false` as well as the `0`/`1` a MySQL flag column comes back as.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Int(value) => value != 0,
    })
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct EventStatusResponse {
    #[serde(deserialize_with = "flag")]
    pub is_ongoing: bool,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ChangeEventResponse {
    #[serde(deserialize_with = "flag")]
    pub new_status: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PerformersResponse {
    pub performers: Vec<Performer>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RosterResponse {
    pub performers: Vec<Performer>,
    pub judges: Vec<Judge>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CurrentPerformerResponse {
    #[serde(default)]
    pub performer: Option<Performer>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct CanVoteResponse {
    #[serde(rename = "canVote", deserialize_with = "flag")]
    pub can_vote: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoginResponse {
    pub judge: Judge,
}

/// One cell of the bystander matrix as reported by `/current-scores`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ScoreEntry {
    pub performer_id: PerformerId,
    pub judge_id: JudgeId,
    pub total_score: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CurrentScoresResponse {
    pub scores: Vec<ScoreEntry>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct JudgeScore {
    pub judge_name: String,
    pub presentation: u8,
    pub stage_presence: u8,
    pub choreography: u8,
    pub timing: u8,
    pub performance: u8,
    pub weight: f64,
    pub weighted_score: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FinalScoreEntry {
    pub performer_name: String,
    pub total_score: f64,
    #[serde(default)]
    pub judge_scores: Vec<JudgeScore>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FinalScoresResponse {
    pub scores: Vec<FinalScoreEntry>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct CategoryScores {
    pub presentation: u8,
    pub stage_presence: u8,
    pub choreography: u8,
    pub timing: u8,
    pub performance: u8,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ScoreSubmission {
    pub judge_id: JudgeId,
    pub performer_id: PerformerId,
    pub scores: CategoryScores,
}

#[derive(Debug, Serialize, Clone, Copy)]
pub struct SetCurrentPerformerRequest {
    pub performer_id: PerformerId,
}

#[derive(Debug, Serialize, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreCategory {
    Presentation,
    StagePresence,
    Choreography,
    Timing,
    Performance,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 5] = [
        ScoreCategory::Presentation,
        ScoreCategory::StagePresence,
        ScoreCategory::Choreography,
        ScoreCategory::Timing,
        ScoreCategory::Performance,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ScoreCategory::Presentation => "Presentation",
            ScoreCategory::StagePresence => "Stage Presence",
            ScoreCategory::Choreography => "Choreography",
            ScoreCategory::Timing => "Timing",
            ScoreCategory::Performance => "Performance",
        }
    }
}

pub const MIN_CATEGORY_SCORE: u8 = 1;
pub const MAX_CATEGORY_SCORE: u8 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_flags_accept_integer_columns() {
        let started: EventStatusResponse = serde_json::from_str(r#"{"is_ongoing":1}"#).unwrap();
        assert!(started.is_ongoing);
        let stopped: EventStatusResponse = serde_json::from_str(r#"{"is_ongoing":0}"#).unwrap();
        assert!(!stopped.is_ongoing);
        let toggled: ChangeEventResponse = serde_json::from_str(r#"{"new_status":1}"#).unwrap();
        assert!(toggled.new_status);
        let vote: CanVoteResponse = serde_json::from_str(r#"{"canVote":false}"#).unwrap();
        assert!(!vote.can_vote);
    }

    #[test]
    fn status_flag_rejects_text() {
        assert!(serde_json::from_str::<EventStatusResponse>(r#"{"is_ongoing":"yes"}"#).is_err());
    }

    #[test]
    fn final_scores_payload_deserializes() {
        let raw = r#"{"scores":[{"performer_name":"Alice","total_score":27.5,"judge_scores":[
            {"judge_name":"J1","presentation":5,"stage_presence":4,"choreography":5,
             "timing":4,"performance":5,"weight":1,"weighted_score":23}]}]}"#;
        let parsed: FinalScoresResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.scores.len(), 1);
        let entry = &parsed.scores[0];
        assert_eq!(entry.performer_name, "Alice");
        assert_eq!(entry.judge_scores[0].stage_presence, 4);
        assert_eq!(entry.judge_scores[0].weighted_score, 23.0);
    }

    #[test]
    fn roster_judges_have_no_email() {
        let raw = r#"{"performers":[{"id":1,"name":"Alice"}],"judges":[{"judge_id":2,"name":"J2"}]}"#;
        let parsed: RosterResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.judges[0].email, None);
        assert_eq!(parsed.performers[0].id, 1);
    }

    #[test]
    fn null_current_performer_is_absent() {
        let parsed: CurrentPerformerResponse =
            serde_json::from_str(r#"{"performer":null}"#).unwrap();
        assert!(parsed.performer.is_none());
    }

    #[test]
    fn submission_serializes_nested_scores() {
        let submission = ScoreSubmission {
            judge_id: 3,
            performer_id: 7,
            scores: CategoryScores {
                presentation: 5,
                stage_presence: 4,
                choreography: 3,
                timing: 2,
                performance: 1,
            },
        };
        let value = serde_json::to_value(&submission).unwrap();
        assert_eq!(value["judge_id"], 3);
        assert_eq!(value["scores"]["stage_presence"], 4);
    }
}
