//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```

use dependency_planner::prelude::*;

fn main() {
    // JSON if logging-json is enabled, pretty if logging-pretty is;
    // planner events only, down to trace level
    dependency_planner::logging::builder()
        .planner_only()
        .trace()
        .init();

    println!("=== Dependency Planner Logging Demo ===\n");

    let catalog = TypeCatalog::new()
        .with(TypeInfo::interface("ICache"))
        .with(TypeInfo::class("MemoryCache").implements("ICache"))
        .with(TypeInfo::class("RedisCache").implements("ICache"))
        .with(TypeInfo::class("Repository").constructor([Parameter::required("ICache")]))
        .with(TypeInfo::class("Service").constructor([Parameter::required("Repository")]))
        .with(TypeInfo::class("Orphan").constructor([Parameter::required("Missing")]));

    let declarations = DeclarationSet::new()
        // Both modules export ICache (logs: "Conflicting import")
        .with(Entity::module("Memory").register(RegisterDeclaration::new("MemoryCache").as_type("ICache")))
        .with(Entity::module("Redis").register(RegisterDeclaration::new("RedisCache").as_type("ICache")))
        .with(
            Entity::container("App")
                .import("Memory")
                .import("Redis")
                .register(RegisterDeclaration::new("Repository"))
                .register(RegisterDeclaration::new("Service"))
                .register(RegisterDeclaration::new("Orphan"))
                .resolves("Service")
                .resolves("Orphan"),
        )
        .with(
            // Overriding ICache directly resolves the conflict
            Entity::container("Fixed")
                .import("Memory")
                .import("Redis")
                .register(RegisterDeclaration::new("MemoryCache").as_type("ICache"))
                .register(RegisterDeclaration::new("Repository"))
                .register(RegisterDeclaration::new("Service"))
                .resolves("Service"),
        );

    let planner = Planner::new(catalog, declarations);

    // Logs table construction, cache hits and every resolution step
    let plans = match planner.plan_all() {
        Ok(plans) => plans,
        Err(e) => {
            eprintln!("planning failed: {e}");
            return;
        }
    };

    // Served from the binding cache (logs: "Binding table served from cache")
    let _ = planner.bindings(&"App".into());

    for plan in &plans {
        println!(
            "{}: {} diagnostic(s), buildable: {}",
            plan.entity(),
            plan.all_diagnostics().count(),
            plan.is_buildable()
        );
    }

    println!("\n=== Demo Complete ===");
    println!("\nTip: Use --features logging-json for production (JSON output)");
    println!("     Use --features logging-pretty for development (colorful output)");
}
