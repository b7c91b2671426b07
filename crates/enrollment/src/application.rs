//! Typed, fully-validated enrollment application data.
//!
//! The wizard works on a loose field bag; once submitted, the server side
//! parses that bag into an `EnrollmentApplication` whose value objects have
//! already enforced format and checksum rules (defense in depth: the same
//! checks the client ran).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use matricula_core::{BirthDate, Cep, Cpf, DomainError, DomainResult, Phone};

/// Schooling level of the applicant; determines the valid school years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchoolingLevel {
    /// Ensino Fundamental 2 (grades 6–9).
    #[serde(rename = "Ensino Fundamental 2")]
    FundamentalTwo,
    /// Ensino Médio (grades 1–3).
    #[serde(rename = "Ensino Médio")]
    EnsinoMedio,
}

impl SchoolingLevel {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        match raw {
            "Ensino Fundamental 2" => Ok(Self::FundamentalTwo),
            "Ensino Médio" => Ok(Self::EnsinoMedio),
            _ => Err(DomainError::validation("unknown schooling level")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FundamentalTwo => "Ensino Fundamental 2",
            Self::EnsinoMedio => "Ensino Médio",
        }
    }
}

impl core::fmt::Display for SchoolingLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// School-year options for a schooling level (or for none selected yet).
///
/// The set is a function of the level, which is why editing the level resets
/// the dependent school-year field in the wizard.
pub fn school_year_options(level: Option<SchoolingLevel>) -> &'static [&'static str] {
    match level {
        Some(SchoolingLevel::FundamentalTwo) => &["6º ano", "7º ano", "8º ano", "9º ano"],
        Some(SchoolingLevel::EnsinoMedio) => &["1º ano", "2º ano", "3º ano"],
        None => &[],
    }
}

/// Residential address as collected on the address step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "cep")]
    pub postal_code: Cep,
    #[serde(rename = "logradouro")]
    pub street: String,
    #[serde(rename = "numero")]
    pub number: String,
    #[serde(rename = "complemento", default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    #[serde(rename = "bairro")]
    pub district: String,
    #[serde(rename = "cidade")]
    pub city: String,
    #[serde(rename = "estado")]
    pub state: String,
}

impl Address {
    fn validate(&self) -> DomainResult<()> {
        if self.street.trim().is_empty() {
            return Err(DomainError::validation("street is required"));
        }
        if self.number.trim().is_empty() {
            return Err(DomainError::validation("street number is required"));
        }
        if self.district.trim().is_empty() {
            return Err(DomainError::validation("district is required"));
        }
        if self.city.trim().is_empty() {
            return Err(DomainError::validation("city is required"));
        }
        let state_ok =
            self.state.chars().count() == 2 && self.state.chars().all(|c| c.is_ascii_uppercase());
        if !state_ok {
            return Err(DomainError::validation("state must be a 2-letter code"));
        }
        Ok(())
    }
}

/// The full, typed enrollment field bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentApplication {
    pub email: String,
    #[serde(rename = "nome")]
    pub name: String,
    pub cpf: Cpf,
    #[serde(rename = "data_nascimento")]
    pub birth_date: BirthDate,
    #[serde(flatten)]
    pub address: Address,
    #[serde(rename = "nome_responsavel")]
    pub guardian_name: String,
    #[serde(rename = "telefone_whatsapp")]
    pub guardian_phone: Phone,
    #[serde(rename = "escolaridade")]
    pub schooling_level: SchoolingLevel,
    #[serde(rename = "ano_escolar")]
    pub school_year: String,
    #[serde(rename = "curso")]
    pub course: String,
}

impl EnrollmentApplication {
    /// Re-run the wizard's semantic checks server-side.
    ///
    /// `reference` is the submission date (for the age gate).
    pub fn validate(&self, reference: NaiveDate) -> DomainResult<()> {
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(DomainError::validation("a valid e-mail is required"));
        }
        if self.name.trim().chars().count() < 2 {
            return Err(DomainError::validation(
                "name must have at least 2 characters",
            ));
        }
        self.birth_date.validate_against(reference)?;
        self.address.validate()?;
        if self.guardian_name.trim().chars().count() < 2 {
            return Err(DomainError::validation(
                "guardian name must have at least 2 characters",
            ));
        }
        if !school_year_options(Some(self.schooling_level)).contains(&self.school_year.as_str()) {
            return Err(DomainError::validation(
                "school year does not match the schooling level",
            ));
        }
        if self.course.trim().is_empty() {
            return Err(DomainError::validation("course is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_application() -> EnrollmentApplication {
        EnrollmentApplication {
            email: "ana@example.com".to_string(),
            name: "Ana Silva".to_string(),
            cpf: Cpf::parse("111.444.777-35").unwrap(),
            birth_date: BirthDate::parse("2010-06-15").unwrap(),
            address: Address {
                postal_code: Cep::parse("65900-100").unwrap(),
                street: "Rua das Flores".to_string(),
                number: "42".to_string(),
                complement: None,
                district: "Centro".to_string(),
                city: "Imperatriz".to_string(),
                state: "MA".to_string(),
            },
            guardian_name: "Maria Silva".to_string(),
            guardian_phone: Phone::parse("(99) 98123-4567").unwrap(),
            schooling_level: SchoolingLevel::EnsinoMedio,
            school_year: "1º ano".to_string(),
            course: "Jogos Digitais".to_string(),
        }
    }

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[test]
    fn sample_application_validates() {
        assert!(sample_application().validate(reference()).is_ok());
    }

    #[test]
    fn school_year_must_match_level() {
        let mut app = sample_application();
        app.school_year = "6º ano".to_string(); // Fundamental-2 year on Ensino Médio
        assert!(app.validate(reference()).is_err());
    }

    #[test]
    fn state_must_be_two_uppercase_letters() {
        let mut app = sample_application();
        app.address.state = "Maranhão".to_string();
        assert!(app.validate(reference()).is_err());
    }

    #[test]
    fn schooling_level_round_trips_through_display_names() {
        for raw in ["Ensino Fundamental 2", "Ensino Médio"] {
            assert_eq!(SchoolingLevel::parse(raw).unwrap().as_str(), raw);
        }
        assert!(SchoolingLevel::parse("Ensino Superior").is_err());
    }

    #[test]
    fn options_depend_on_level() {
        assert_eq!(school_year_options(Some(SchoolingLevel::FundamentalTwo)).len(), 4);
        assert_eq!(school_year_options(Some(SchoolingLevel::EnsinoMedio)).len(), 3);
        assert!(school_year_options(None).is_empty());
    }

    #[test]
    fn serde_uses_portuguese_wire_keys() {
        let json = serde_json::to_value(sample_application()).unwrap();
        assert_eq!(json["nome"], "Ana Silva");
        assert_eq!(json["data_nascimento"], "2010-06-15");
        assert_eq!(json["cep"], "65900100");
        assert_eq!(json["escolaridade"], "Ensino Médio");
    }
}
