//! Plans a small application container and prints the result
//!
//! ```bash
//! cargo run --example plan
//! ```

use dependency_planner::prelude::*;
use dependency_planner::PlanEdge;

fn print_plan(plan: &ResolutionPlan) {
    for (index, node) in plan.nodes().iter().enumerate() {
        let dependencies: Vec<String> = node
            .dependencies
            .iter()
            .map(|edge| match edge {
                PlanEdge::Node(id) => format!("#{}", id.index()),
                PlanEdge::Default(ty) => format!("default({ty})"),
            })
            .collect();
        println!(
            "    #{index} {} via {} [{}{}] <- {}",
            node.of_type(),
            node.source.kind_name(),
            node.scope,
            if node.is_async { ", async" } else { "" },
            dependencies.join(", "),
        );
    }
}

fn main() {
    let catalog = TypeCatalog::new()
        .with(TypeInfo::interface("ILogger"))
        .with(TypeInfo::class("ConsoleLogger").implements("ILogger"))
        .with(TypeInfo::interface("IHandler"))
        .with(TypeInfo::class("Database").requires_async_initialization())
        .with(TypeInfo::class("Request"))
        .with(
            TypeInfo::class("Handler")
                .implements("IHandler")
                .constructor([Parameter::required("Request"), Parameter::required("ILogger")]),
        )
        .with(
            TypeInfo::class("RetryHandler")
                .implements("IHandler")
                .constructor([Parameter::required("IHandler")]),
        )
        .with(TypeInfo::delegate(
            "Func<Request, IHandler>",
            DelegateSignature::returning("IHandler").param(DelegateParam::new("Request")),
        ))
        .with(TypeInfo::array("IHandler[]", "IHandler"))
        .with(
            TypeInfo::class("Server").constructor([
                Parameter::required("Func<Request, IHandler>"),
                Parameter::required("ILogger"),
                Parameter::optional("Database"),
            ]),
        );

    let declarations = DeclarationSet::new()
        .with(
            Entity::module("Logging").register(
                RegisterDeclaration::new("ConsoleLogger")
                    .as_type("ILogger")
                    .scope(Scope::SingleInstance),
            ),
        )
        .with(
            Entity::container("App")
                .import("Logging")
                .register(RegisterDeclaration::new("Handler").as_type("IHandler"))
                .register(RegisterDeclaration::new("Server"))
                .decorator(DecoratorDeclaration::new("RetryHandler", "IHandler"))
                .resolves("Server")
                .resolves("IHandler[]"),
        );

    let planner = Planner::new(catalog, declarations);
    let plan = match planner.plan_container(&"App".into()) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("planning failed: {e}");
            return;
        }
    };

    println!("=== Container {} ===\n", plan.entity());
    for diagnostic in plan.diagnostics() {
        println!("  {diagnostic}");
    }

    for resolution in plan.resolutions() {
        println!("  {}:", resolution.request().ty);
        match resolution.plan() {
            Some(resolved) => print_plan(resolved),
            None => println!("    (not resolvable)"),
        }
        for diagnostic in resolution.diagnostics() {
            println!("    {diagnostic}");
        }
    }

    println!(
        "\nBuildable: {}",
        if plan.is_buildable() { "yes" } else { "no" }
    );
}
