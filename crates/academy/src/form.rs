//! Multi-stage intake forms attached to commissions.
//!
//! Clients describe a form with labels only ([`NewForm`]); ids for questions
//! and options are assigned here so answers can reference them stably.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aula_core::{Entity, FormId, OptionId, QuestionId, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    ShortText,
    LongText,
    Number,
    Date,
    SingleChoice,
    MultipleChoice,
}

impl QuestionKind {
    pub fn is_choice(&self) -> bool {
        matches!(self, QuestionKind::SingleChoice | QuestionKind::MultipleChoice)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: OptionId,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: String,
    pub kind: QuestionKind,
    pub required: bool,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
}

impl Question {
    pub fn has_option(&self, id: OptionId) -> bool {
        self.options.iter().any(|o| o.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormStage {
    pub title: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    pub id: FormId,
    pub title: String,
    pub description: Option<String>,
    pub stages: Vec<FormStage>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Form {
    type Id = FormId;

    fn id(&self) -> FormId {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewQuestion {
    pub prompt: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub required: bool,
    /// Option labels, for choice questions.
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStage {
    pub title: String,
    pub questions: Vec<NewQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewForm {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub stages: Vec<NewStage>,
}

impl NewForm {
    pub fn into_form(self, now: DateTime<Utc>) -> Result<Form, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(!self.title.trim().is_empty(), "title", "cannot be empty");
        let stages = match build_stages(self.stages) {
            Ok(stages) => stages,
            Err(e) => {
                errors.extend(e);
                Vec::new()
            }
        };
        errors.into_result()?;

        Ok(Form {
            id: FormId::new(),
            title: self.title.trim().to_string(),
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            stages,
            created_at: now,
        })
    }
}

/// Validate stage definitions and assign question/option ids.
pub fn build_stages(stages: Vec<NewStage>) -> Result<Vec<FormStage>, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if stages.is_empty() {
        errors.push("stages", "at least one stage is required");
        return Err(errors);
    }

    let mut built = Vec::with_capacity(stages.len());
    for (s, stage) in stages.into_iter().enumerate() {
        errors.check(
            !stage.title.trim().is_empty(),
            format!("stages[{s}].title"),
            "cannot be empty",
        );
        errors.check(
            !stage.questions.is_empty(),
            format!("stages[{s}].questions"),
            "at least one question is required",
        );

        let mut questions = Vec::with_capacity(stage.questions.len());
        for (q, question) in stage.questions.into_iter().enumerate() {
            let path = format!("stages[{s}].questions[{q}]");
            errors.check(
                !question.prompt.trim().is_empty(),
                format!("{path}.prompt"),
                "cannot be empty",
            );
            check_options(&mut errors, &path, question.kind, &question.options);

            questions.push(Question {
                id: QuestionId::new(),
                prompt: question.prompt.trim().to_string(),
                kind: question.kind,
                required: question.required,
                options: question
                    .options
                    .iter()
                    .map(|label| QuestionOption {
                        id: OptionId::new(),
                        label: label.trim().to_string(),
                    })
                    .collect(),
            });
        }

        built.push(FormStage {
            title: stage.title.trim().to_string(),
            questions,
        });
    }

    errors.into_result()?;
    Ok(built)
}

fn check_options(errors: &mut ValidationErrors, path: &str, kind: QuestionKind, labels: &[String]) {
    let field = format!("{path}.options");
    if !kind.is_choice() {
        errors.check(labels.is_empty(), field, "only choice questions take options");
        return;
    }
    if labels.len() < 2 {
        errors.push(field, "choice questions need at least two options");
        return;
    }
    let mut seen = HashSet::new();
    for label in labels {
        let label = label.trim();
        if label.is_empty() {
            errors.push(field.clone(), "option labels cannot be empty");
        } else if !seen.insert(label.to_lowercase()) {
            errors.push(field.clone(), format!("duplicate option '{label}'"));
        }
    }
}

impl Form {
    /// Validate a (possibly patched) form header.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(!self.title.trim().is_empty(), "title", "cannot be empty");
        errors.into_result()
    }

    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.stages.iter().flat_map(|s| s.questions.iter())
    }

    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions().find(|q| q.id == id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn question(prompt: &str, kind: QuestionKind, required: bool, options: &[&str]) -> NewQuestion {
        NewQuestion {
            prompt: prompt.into(),
            kind,
            required,
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    /// Two stages: contact data, then preferences.
    pub(crate) fn sample_form() -> Form {
        NewForm {
            title: "Ingreso".into(),
            description: None,
            stages: vec![
                NewStage {
                    title: "Datos".into(),
                    questions: vec![
                        question("Ocupación", QuestionKind::ShortText, true, &[]),
                        question("Edad", QuestionKind::Number, false, &[]),
                        question("Fecha de alta", QuestionKind::Date, false, &[]),
                    ],
                },
                NewStage {
                    title: "Preferencias".into(),
                    questions: vec![
                        question("Turno", QuestionKind::SingleChoice, true, &["Mañana", "Noche"]),
                        question("Temas", QuestionKind::MultipleChoice, false, &["Web", "CLI", "Embebidos"]),
                        question("Comentarios", QuestionKind::LongText, false, &[]),
                    ],
                },
            ],
        }
        .into_form(Utc::now())
        .unwrap()
    }

    #[test]
    fn ids_are_assigned_and_unique() {
        let form = sample_form();
        let ids: HashSet<_> = form.questions().map(|q| q.id).collect();
        assert_eq!(ids.len(), 6);
        let turno = &form.stages[1].questions[0];
        assert_eq!(turno.options.len(), 2);
        assert!(turno.has_option(turno.options[1].id));
        assert_eq!(form.question(turno.id).map(|q| q.prompt.as_str()), Some("Turno"));
    }

    #[test]
    fn empty_structures_are_rejected() {
        let errs = NewForm {
            title: " ".into(),
            description: None,
            stages: vec![],
        }
        .into_form(Utc::now())
        .unwrap_err();
        assert!(errs.has_field("title"));
        assert!(errs.has_field("stages"));

        let errs = build_stages(vec![NewStage { title: "A".into(), questions: vec![] }]).unwrap_err();
        assert!(errs.has_field("stages[0].questions"));
    }

    #[test]
    fn choice_options_are_checked() {
        let errs = build_stages(vec![NewStage {
            title: "A".into(),
            questions: vec![
                question("one option", QuestionKind::SingleChoice, true, &["x"]),
                question("dupes", QuestionKind::MultipleChoice, true, &["x", " X "]),
                question("text with options", QuestionKind::ShortText, true, &["x"]),
                question(" ", QuestionKind::Number, true, &[]),
            ],
        }])
        .unwrap_err();
        assert!(errs.has_field("stages[0].questions[0].options"));
        assert!(errs.has_field("stages[0].questions[1].options"));
        assert!(errs.has_field("stages[0].questions[2].options"));
        assert!(errs.has_field("stages[0].questions[3].prompt"));
    }

    #[test]
    fn blank_title_fails_validation() {
        let mut form = sample_form();
        assert!(form.validate().is_ok());
        form.title = "  ".into();
        assert!(form.validate().unwrap_err().has_field("title"));
    }
}
