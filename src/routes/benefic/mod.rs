mod model;
mod repository;

use axum::{Router, extract::FromRef};

pub use model::{Benefic, BeneficForm};
pub use repository::PgBeneficRepository;

use crate::{
    AppState,
    controller::{Controller, Entity, FieldCoercionError, entity_routes},
    view::View,
};

impl Entity for Benefic {
    type Form = BeneficForm;

    const NAME: &'static str = "benefic";
    const ROUTE: &'static str = "/benefic";
    const LIST_VIEW: View = View::BeneficList;
    const CREATE_VIEW: View = View::BeneficCreate;

    fn from_form(form: BeneficForm) -> Result<Self, FieldCoercionError> {
        Benefic::try_from(form)
    }
}

impl FromRef<AppState> for Controller<Benefic> {
    fn from_ref(state: &AppState) -> Self {
        Controller {
            repository: state.benefics.clone(),
            views: state.views.clone(),
        }
    }
}

pub fn routes() -> Router<AppState> {
    entity_routes::<Benefic, AppState>()
}
