use serde_json::{Value, json};

use mettportal_auth::{AuthorizationGateway, Principal};

use crate::Command;

/// Evaluate one subcommand against a loaded policy.
pub fn run(gateway: &AuthorizationGateway, command: &Command) -> Value {
    let policy = gateway.policy();
    match command {
        Command::Validate => {
            let registry = policy.registry();
            json!({
                "valid": true,
                "roles": registry.role_names().collect::<Vec<_>>(),
                "menus": registry.menu_table().all_menus(),
                "landing_entries": policy.landing().entries().len(),
                "sign_in": policy.landing().sign_in(),
                "operations": policy.operations().len(),
            })
        }
        Command::Check { roles, require } => {
            json!(policy.authorizer().explain(roles, require))
        }
        Command::Operation { roles, id } => {
            let principal = Principal::from_names(roles.iter().cloned());
            json!({
                "operation": id,
                "requires": policy.operations().required_for(id),
                "decision": gateway.check_operation(&principal, id),
            })
        }
        Command::Landing { roles } => {
            json!({ "route": policy.resolver().default_route(roles) })
        }
        Command::Routes { roles } => {
            let resolver = policy.resolver();
            json!({
                "menus": resolver.accessible_menus(roles),
                "routes": resolver.accessible_routes(roles),
            })
        }
        Command::Who { route } => {
            json!({
                "route": route,
                "roles": policy.resolver().roles_allowed_for_route(route),
            })
        }
        Command::Dump => json!(policy.to_document()),
    }
}
