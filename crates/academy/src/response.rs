use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use aula_core::{CommissionId, Entity, FormId, OptionId, ResponseId, UserId, ValidationErrors};

use crate::form::{Form, Question, QuestionKind};

pub const MAX_SHORT_TEXT: usize = 255;

/// Answers keyed by question id. `null` counts as unanswered.
pub type Answers = BTreeMap<aula_core::QuestionId, Value>;

/// A submitted intake form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: ResponseId,
    pub form_id: FormId,
    pub commission_id: CommissionId,
    pub user_id: UserId,
    pub answers: Answers,
    pub submitted_at: DateTime<Utc>,
}

impl Entity for Response {
    type Id = ResponseId;

    fn id(&self) -> ResponseId {
        self.id
    }
}

impl Response {
    /// Validate every stage and build the record.
    pub fn submit(
        form: &Form,
        commission_id: CommissionId,
        user_id: UserId,
        answers: Answers,
        now: DateTime<Utc>,
    ) -> Result<Response, ValidationErrors> {
        validate_answers(form, &answers)?;
        Ok(Response {
            id: ResponseId::new(),
            form_id: form.id,
            commission_id,
            user_id,
            answers: answers.into_iter().filter(|(_, v)| !v.is_null()).collect(),
            submitted_at: now,
        })
    }
}

/// Validate the answers for a single stage.
///
/// Answers to questions of other stages are ignored so the client may send
/// everything collected so far; ids unknown to the form are rejected.
pub fn validate_stage(form: &Form, stage: usize, answers: &Answers) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let Some(st) = form.stages.get(stage) else {
        errors.push(
            "stage",
            format!("form has {} stage(s), no stage {stage}", form.stages.len()),
        );
        return Err(errors);
    };
    check_unknown(&mut errors, form, answers);
    for question in &st.questions {
        check_question(&mut errors, question, answers.get(&question.id));
    }
    errors.into_result()
}

/// Validate a complete response: every stage plus unknown ids.
pub fn validate_answers(form: &Form, answers: &Answers) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_unknown(&mut errors, form, answers);
    for question in form.questions() {
        check_question(&mut errors, question, answers.get(&question.id));
    }
    errors.into_result()
}

fn check_unknown(errors: &mut ValidationErrors, form: &Form, answers: &Answers) {
    for id in answers.keys() {
        if form.question(*id).is_none() {
            errors.push(format!("answers.{id}"), "not a question of this form");
        }
    }
}

fn check_question(errors: &mut ValidationErrors, question: &Question, answer: Option<&Value>) {
    let field = format!("answers.{}", question.id);
    let answer = answer.filter(|v| !is_blank(v));

    let Some(value) = answer else {
        errors.check(!question.required, field, "an answer is required");
        return;
    };

    match question.kind {
        QuestionKind::ShortText | QuestionKind::LongText => match value.as_str() {
            Some(text) => {
                if question.kind == QuestionKind::ShortText {
                    errors.check(
                        text.chars().count() <= MAX_SHORT_TEXT,
                        field,
                        format!("must be at most {MAX_SHORT_TEXT} characters"),
                    );
                }
            }
            None => errors.push(field, "must be text"),
        },
        QuestionKind::Number => errors.check(value.is_number(), field, "must be a number"),
        QuestionKind::Date => errors.check(
            value
                .as_str()
                .is_some_and(|s| s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()),
            field,
            "must be a date (YYYY-MM-DD)",
        ),
        QuestionKind::SingleChoice => errors.check(
            option_of(question, value).is_some(),
            field,
            "must be one of the question's option ids",
        ),
        QuestionKind::MultipleChoice => {
            let Some(items) = value.as_array() else {
                errors.push(field, "must be a list of option ids");
                return;
            };
            let mut seen = HashSet::new();
            for item in items {
                match option_of(question, item) {
                    Some(id) if !seen.insert(id) => {
                        errors.push(field.clone(), format!("option {id} selected twice"));
                    }
                    Some(_) => {}
                    None => errors.push(field.clone(), format!("{item} is not an option of this question")),
                }
            }
        }
    }
}

/// Resolve a JSON value to one of the question's option ids.
fn option_of(question: &Question, value: &Value) -> Option<OptionId> {
    let id: OptionId = value.as_str()?.parse().ok()?;
    question.has_option(id).then_some(id)
}

/// Unanswered: null, blank text or an empty selection.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::tests::sample_form;
    use aula_core::QuestionId;
    use serde_json::json;

    fn ids(form: &Form) -> Vec<QuestionId> {
        form.questions().map(|q| q.id).collect()
    }

    fn valid_answers(form: &Form) -> Answers {
        let q = ids(form);
        let turno = &form.stages[1].questions[0];
        let temas = &form.stages[1].questions[1];
        let mut answers = Answers::new();
        answers.insert(q[0], json!("Desarrolladora"));
        answers.insert(q[1], json!(31));
        answers.insert(q[2], json!("2026-01-15"));
        answers.insert(q[3], json!(turno.options[1].id.to_string()));
        answers.insert(
            q[4],
            json!([temas.options[0].id.to_string(), temas.options[2].id.to_string()]),
        );
        answers
    }

    #[test]
    fn complete_response_passes() {
        let form = sample_form();
        let answers = valid_answers(&form);
        assert!(validate_answers(&form, &answers).is_ok());
        let response = Response::submit(&form, CommissionId::new(), UserId::new(), answers, Utc::now()).unwrap();
        assert_eq!(response.form_id, form.id);
        assert_eq!(response.answers.len(), 5);
    }

    #[test]
    fn missing_required_answer_is_reported_per_stage() {
        let form = sample_form();
        let q = ids(&form);
        let mut answers = valid_answers(&form);
        answers.insert(q[0], json!("   "));

        let errs = validate_stage(&form, 0, &answers).unwrap_err();
        assert!(errs.has_field(&format!("answers.{}", q[0])));
        assert!(validate_stage(&form, 1, &answers).is_ok());
    }

    #[test]
    fn kinds_are_enforced() {
        let form = sample_form();
        let q = ids(&form);
        let mut answers = valid_answers(&form);
        answers.insert(q[0], json!("x".repeat(MAX_SHORT_TEXT + 1)));
        answers.insert(q[1], json!("thirty"));
        answers.insert(q[2], json!("15/01/2026"));
        answers.insert(q[3], json!(OptionId::new().to_string()));
        let errs = validate_answers(&form, &answers).unwrap_err();
        for id in &q[..4] {
            assert!(errs.has_field(&format!("answers.{id}")), "{errs}");
        }
    }

    #[test]
    fn repeated_choices_are_rejected() {
        let form = sample_form();
        let q = ids(&form);
        let temas = &form.stages[1].questions[1];
        let mut answers = valid_answers(&form);
        let web = temas.options[0].id.to_string();
        answers.insert(q[4], json!([web.clone(), web]));
        assert!(validate_answers(&form, &answers).unwrap_err().has_field(&format!("answers.{}", q[4])));
    }

    #[test]
    fn unknown_questions_and_stages_are_rejected() {
        let form = sample_form();
        let mut answers = valid_answers(&form);
        let stray = QuestionId::new();
        answers.insert(stray, json!("?"));
        assert!(validate_stage(&form, 0, &answers).unwrap_err().has_field(&format!("answers.{stray}")));
        assert!(validate_stage(&form, 2, &Answers::new()).unwrap_err().has_field("stage"));
    }

    #[test]
    fn answers_round_trip_with_uuid_keys() {
        let form = sample_form();
        let answers = valid_answers(&form);
        let json = serde_json::to_value(&answers).unwrap();
        let back: Answers = serde_json::from_value(json).unwrap();
        assert_eq!(back, answers);
    }
}
