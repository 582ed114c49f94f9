// User account wizard, used for staff and for customer accounts.

use super::record::FormRecord;
use super::wizard::{FieldKind, FieldSpec, StepDefinition, WizardSchema};
use super::{ErrorMap, FormError};
use crate::models::requests::CreateUserRequest;
use crate::utils::validation;

pub const STAFF_ROLES: &[&str] = &["admin", "staff", "warehouse"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Staff,
    Customer,
}

impl AccountKind {
    pub fn min_password_len(self) -> usize {
        match self {
            AccountKind::Staff => 8,
            AccountKind::Customer => 6,
        }
    }
}

const STAFF_ACCOUNT: &[FieldSpec] = &[
    FieldSpec::new("fullName", "Full name", FieldKind::Text),
    FieldSpec::new("email", "Email", FieldKind::Text),
    FieldSpec::new("phone", "Phone", FieldKind::Text),
];

const CUSTOMER_ACCOUNT: &[FieldSpec] = &[
    FieldSpec::new("fullName", "Full name", FieldKind::Text),
    FieldSpec::new("email", "Email", FieldKind::Text),
    FieldSpec::new("phone", "Phone", FieldKind::Text),
    FieldSpec::new("company", "Company (optional)", FieldKind::Text),
];

const CREDENTIALS: &[FieldSpec] = &[
    FieldSpec::new("password", "Password", FieldKind::Secret),
    FieldSpec::new("confirmPassword", "Confirm password", FieldKind::Secret),
];

const ROLE: &[FieldSpec] = &[
    FieldSpec::new("role", "Role", FieldKind::Choice(STAFF_ROLES)),
    FieldSpec::new("warehouseId", "Warehouse (warehouse staff)", FieldKind::Text),
];

const STAFF_STEPS: &[StepDefinition] = &[
    StepDefinition {
        id: "account",
        title: "Account",
        fields: STAFF_ACCOUNT,
    },
    StepDefinition {
        id: "credentials",
        title: "Password",
        fields: CREDENTIALS,
    },
    StepDefinition {
        id: "role",
        title: "Role",
        fields: ROLE,
    },
];

const CUSTOMER_STEPS: &[StepDefinition] = &[
    StepDefinition {
        id: "account",
        title: "Account",
        fields: CUSTOMER_ACCOUNT,
    },
    StepDefinition {
        id: "credentials",
        title: "Password",
        fields: CREDENTIALS,
    },
];

#[derive(Debug, Clone, Copy)]
pub struct UserSchema {
    kind: AccountKind,
}

impl UserSchema {
    pub fn staff() -> Self {
        Self {
            kind: AccountKind::Staff,
        }
    }

    pub fn customer() -> Self {
        Self {
            kind: AccountKind::Customer,
        }
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }
}

impl WizardSchema for UserSchema {
    type Payload = CreateUserRequest;

    fn title(&self) -> &'static str {
        match self.kind {
            AccountKind::Staff => "New staff member",
            AccountKind::Customer => "New customer",
        }
    }

    fn steps(&self) -> &'static [StepDefinition] {
        match self.kind {
            AccountKind::Staff => STAFF_STEPS,
            AccountKind::Customer => CUSTOMER_STEPS,
        }
    }

    fn blank_record(&self) -> FormRecord {
        let role = match self.kind {
            AccountKind::Staff => "staff",
            AccountKind::Customer => "customer",
        };
        FormRecord::new()
            .with("fullName", "")
            .with("email", "")
            .with("phone", "")
            .with("company", "")
            .with("password", "")
            .with("confirmPassword", "")
            .with("role", role)
            .with("warehouseId", "")
    }

    fn validate_step(&self, step: &StepDefinition, record: &FormRecord) -> ErrorMap {
        let mut errors = ErrorMap::new();
        match step.id {
            "account" => {
                validation::require(&mut errors, "fullName", record.text("fullName"), "Full name");
                validation::check_email(&mut errors, "email", record.text("email"));
                validation::check_phone(&mut errors, "phone", record.text("phone"));
            }
            "credentials" => validation::check_password_pair(
                &mut errors,
                "password",
                "confirmPassword",
                record.text("password"),
                record.text("confirmPassword"),
                self.kind.min_password_len(),
            ),
            "role" => {
                let role = record.text("role");
                if !STAFF_ROLES.contains(&role) {
                    errors.insert("role", "Select a valid role");
                } else if role == "warehouse" && record.text("warehouseId").trim().is_empty() {
                    errors.insert("warehouseId", "Warehouse staff must be assigned to a warehouse");
                }
            }
            _ => {}
        }
        errors
    }

    fn build_payload(&self, record: &FormRecord) -> Result<CreateUserRequest, FormError> {
        let role = record.text("role").to_string();
        let company = record.text("company").trim();
        let warehouse = record.text("warehouseId").trim();
        Ok(CreateUserRequest {
            full_name: record.text("fullName").trim().to_string(),
            email: record.text("email").trim().to_lowercase(),
            phone: record.text("phone").trim().to_string(),
            password: record.text("password").to_string(),
            company: (self.kind == AccountKind::Customer && !company.is_empty())
                .then(|| company.to_string()),
            warehouse_id: (role == "warehouse" && !warehouse.is_empty()).then(|| warehouse.to_string()),
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{StepOutcome, Wizard};

    fn past_account(schema: UserSchema) -> Wizard<UserSchema> {
        let mut wizard = Wizard::new(schema).unwrap();
        wizard.set_field("fullName", "Ines Costa").unwrap();
        wizard.set_field("email", "Ines@Freight.test").unwrap();
        wizard.set_field("phone", "+351 912 345 678").unwrap();
        assert_eq!(wizard.advance(), StepOutcome::Advanced(1));
        wizard
    }

    #[test]
    fn mismatched_passwords_block_the_credentials_step() {
        let mut wizard = past_account(UserSchema::staff());
        wizard.set_field("password", "Abc12345").unwrap();
        wizard.set_field("confirmPassword", "Abc1234").unwrap();
        match wizard.advance() {
            StepOutcome::Blocked(errors) => {
                assert_eq!(errors.get("confirmPassword"), Some("Passwords do not match"));
            }
            other => panic!("expected Blocked, got {:?}", other),
        }
        assert_eq!(wizard.active_step(), 1);
    }

    #[test]
    fn minimum_length_depends_on_account_kind() {
        for (schema, ok) in [(UserSchema::staff(), false), (UserSchema::customer(), true)] {
            let mut wizard = past_account(schema);
            wizard.set_field("password", "secret1").unwrap();
            wizard.set_field("confirmPassword", "secret1").unwrap();
            let (first_failing, _) = wizard.validate_all();
            assert_eq!(first_failing.is_none(), ok, "{:?}", schema.kind());
        }
    }

    #[test]
    fn warehouse_role_needs_a_warehouse() {
        let mut wizard = past_account(UserSchema::staff());
        wizard.set_field("password", "Abc12345").unwrap();
        wizard.set_field("confirmPassword", "Abc12345").unwrap();
        wizard.advance();
        wizard.set_field("role", "warehouse").unwrap();
        let request_err = wizard.prepare_submit().unwrap_err();
        assert!(request_err.to_string().contains("step 2"));

        wizard.set_field("warehouseId", "wh-lis-01").unwrap();
        let request = wizard.prepare_submit().unwrap();
        assert_eq!(request.role, "warehouse");
        assert_eq!(request.email, "ines@freight.test");
        assert_eq!(request.warehouse_id.as_deref(), Some("wh-lis-01"));
        assert_eq!(request.company, None);
    }

    #[test]
    fn customer_accounts_skip_the_role_step() {
        let mut wizard = past_account(UserSchema::customer());
        wizard.set_field("password", "abc123").unwrap();
        wizard.set_field("confirmPassword", "abc123").unwrap();
        assert!(wizard.is_last_step());
        assert_eq!(wizard.advance(), StepOutcome::AtLastStep);
        let request = wizard.prepare_submit().unwrap();
        assert_eq!(request.role, "customer");
    }
}
