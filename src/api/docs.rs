use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::OpenApi as OpenApiSpec;
use utoipa::{Modify, OpenApi};

use crate::db::queries::admin::AdminDoc;
use crate::db::queries::appointment::AppointmentDoc;
use crate::db::queries::booking::BookingDoc;
use crate::db::queries::doctor::DoctorDoc;

/// Registers the `bearerAuth` scheme referenced by secured paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut OpenApiSpec) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Sanjeevani booking API", description = "Doctor booking requests and their review"),
    modifiers(&SecurityAddon)
)]
struct RootDoc;

pub fn api_doc() -> OpenApiSpec {
    RootDoc::openapi()
        .merge_from(DoctorDoc::openapi())
        .merge_from(BookingDoc::openapi())
        .merge_from(AppointmentDoc::openapi())
        .merge_from(AdminDoc::openapi())
}
