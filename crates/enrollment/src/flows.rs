//! Wizard flow definitions.
//!
//! Two flow variants exist: the general enrollment form (5 steps) and the
//! event variant (7 steps), which prepends a regulations-acceptance step and
//! appends a final confirmation step to the same core sequence.

use crate::schema::{ConfirmationSpec, FieldSpec, Rule, StepSchema};

/// Course options offered on the course-assignment step.
pub const COURSE_OPTIONS: &[&str] = &["Jogos Digitais", "Robótica"];

/// Schooling-level options (drives the dependent school-year field).
pub const SCHOOLING_OPTIONS: &[&str] = &["Ensino Fundamental 2", "Ensino Médio"];

/// Which flow variant a wizard runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    /// Regular course intake: 5 steps.
    General,
    /// Special event intake: regulations + the 5 core steps + confirmation.
    Event,
}

/// An ordered list of step schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flow {
    kind: FlowKind,
    steps: Vec<StepSchema>,
}

impl Flow {
    pub fn general() -> Self {
        Self {
            kind: FlowKind::General,
            steps: core_steps(),
        }
    }

    pub fn event() -> Self {
        let mut steps = Vec::with_capacity(7);
        steps.push(regulations_step());
        steps.extend(core_steps());
        steps.push(confirmation_step());
        Self {
            kind: FlowKind::Event,
            steps,
        }
    }

    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 1-based step access.
    pub fn step(&self, number: usize) -> Option<&StepSchema> {
        number.checked_sub(1).and_then(|i| self.steps.get(i))
    }

    pub fn steps(&self) -> &[StepSchema] {
        &self.steps
    }
}

fn regulations_step() -> StepSchema {
    StepSchema {
        title: "regulamento",
        fields: vec![],
        confirmations: vec![ConfirmationSpec {
            name: "aceito_regulamentos",
            message: "the regulations must be accepted to continue",
        }],
    }
}

fn confirmation_step() -> StepSchema {
    StepSchema {
        title: "confirmacao",
        fields: vec![],
        confirmations: vec![ConfirmationSpec {
            name: "confirma_dados",
            message: "confirm that the provided data is accurate",
        }],
    }
}

fn core_steps() -> Vec<StepSchema> {
    vec![
        personal_step(),
        address_step(),
        guardian_step(),
        schooling_step(),
        course_step(),
    ]
}

fn personal_step() -> StepSchema {
    StepSchema {
        title: "dados pessoais",
        fields: vec![
            FieldSpec::new(
                "nome",
                vec![
                    (Rule::Required, "name is required"),
                    (Rule::MinLen(2), "name must have at least 2 characters"),
                ],
            ),
            FieldSpec::new(
                "cpf",
                vec![
                    (Rule::Required, "CPF is required"),
                    (Rule::MinLen(14), "CPF must be complete"),
                    (Rule::ValidCpf, "invalid CPF"),
                ],
            ),
            FieldSpec::new(
                "data_nascimento",
                vec![
                    (Rule::Required, "birth date is required"),
                    (
                        Rule::MinimumAge(10),
                        "applicant must be at least 10 years old",
                    ),
                ],
            ),
        ],
        confirmations: vec![ConfirmationSpec {
            name: "genero_confirmado",
            message: "confirm the self-identification statement",
        }],
    }
}

fn address_step() -> StepSchema {
    StepSchema {
        title: "endereço",
        fields: vec![
            FieldSpec::new(
                "cep",
                vec![
                    (Rule::Required, "CEP is required"),
                    (Rule::ExactDigits(8), "CEP must be complete"),
                ],
            ),
            FieldSpec::new("logradouro", vec![(Rule::Required, "street is required")]),
            FieldSpec::new("numero", vec![(Rule::Required, "number is required")]),
            FieldSpec::new("complemento", vec![]),
            FieldSpec::new("bairro", vec![(Rule::Required, "district is required")]),
            FieldSpec::new("cidade", vec![(Rule::Required, "city is required")]),
            FieldSpec::new(
                "estado",
                vec![
                    (Rule::Required, "state is required"),
                    (Rule::UppercaseLetters(2), "state must be a 2-letter code"),
                ],
            ),
        ],
        confirmations: vec![],
    }
}

fn guardian_step() -> StepSchema {
    StepSchema {
        title: "responsável",
        fields: vec![
            FieldSpec::new(
                "nome_responsavel",
                vec![
                    (Rule::Required, "guardian name is required"),
                    (
                        Rule::MinLen(2),
                        "guardian name must have at least 2 characters",
                    ),
                ],
            ),
            FieldSpec::new(
                "telefone_whatsapp",
                vec![
                    (Rule::Required, "phone is required"),
                    (Rule::MinLen(15), "phone must be complete"),
                ],
            ),
        ],
        confirmations: vec![],
    }
}

fn schooling_step() -> StepSchema {
    StepSchema {
        title: "escolaridade",
        fields: vec![
            FieldSpec::new(
                "escolaridade",
                vec![
                    (Rule::Required, "schooling level is required"),
                    (Rule::OneOf(SCHOOLING_OPTIONS), "unknown schooling level"),
                ],
            ),
            FieldSpec::new(
                "ano_escolar",
                vec![(Rule::Required, "school year is required")],
            ),
        ],
        confirmations: vec![],
    }
}

fn course_step() -> StepSchema {
    StepSchema {
        title: "curso",
        fields: vec![FieldSpec::new(
            "curso",
            vec![
                (Rule::Required, "course is required"),
                (Rule::OneOf(COURSE_OPTIONS), "unknown course"),
            ],
        )],
        confirmations: vec![],
    }
}
