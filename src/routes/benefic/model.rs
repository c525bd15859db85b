use serde::{Deserialize, Serialize};

use crate::controller::FieldCoercionError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Benefic {
    pub id: Option<i32>,
    pub compname: String,
    pub types: String,
    pub status: String,
    pub client_id: i32,
}

impl Default for Benefic {
    fn default() -> Self {
        Self {
            id: None,
            compname: String::new(),
            types: String::new(),
            status: "active".to_string(),
            client_id: 0,
        }
    }
}

// 新建表单提交的原始字段
#[derive(Debug, Default, Deserialize)]
pub struct BeneficForm {
    #[serde(default)]
    pub compname: String,
    #[serde(default)]
    pub types: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub cliente: String,
}

impl TryFrom<BeneficForm> for Benefic {
    type Error = FieldCoercionError;

    fn try_from(form: BeneficForm) -> Result<Self, Self::Error> {
        let client_id = form
            .cliente
            .trim()
            .parse::<i32>()
            .map_err(|_| FieldCoercionError::new("cliente", form.cliente.clone()))?;

        Ok(Benefic {
            id: None,
            compname: form.compname,
            types: form.types,
            status: form.status,
            client_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(cliente: &str) -> BeneficForm {
        BeneficForm {
            compname: "Acme".into(),
            types: "gold".into(),
            status: "active".into(),
            cliente: cliente.into(),
        }
    }

    #[test]
    fn numeric_client_is_coerced() {
        let benefic = Benefic::try_from(form(" 42 ")).unwrap();
        assert_eq!(
            benefic,
            Benefic {
                id: None,
                compname: "Acme".into(),
                types: "gold".into(),
                status: "active".into(),
                client_id: 42,
            }
        );
    }

    #[test]
    fn non_numeric_client_is_rejected() {
        let err = Benefic::try_from(form("abc")).unwrap_err();
        assert_eq!(err, FieldCoercionError::new("cliente", "abc"));
    }

    #[test]
    fn empty_client_is_rejected() {
        assert!(Benefic::try_from(form("")).is_err());
        assert!(Benefic::try_from(form("99999999999")).is_err());
    }
}
