use netbuilder::plan::NetworkPlan;
use tracing::{error, info};

use crate::render::{render_rows, OutputFormat, SubnetRow};

/// Execute a plan and print every subnet it allocates.
pub fn run_plan(plan: &NetworkPlan, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render(plan, format)?);

    Ok(())
}

fn render(plan: &NetworkPlan, format: OutputFormat) -> Result<String, Box<dyn std::error::Error>> {
    let allocations = match plan.allocate() {
        Ok(allocations) => allocations,
        Err(e) => {
            error!("Failed to allocate plan for {}: {e}", plan.cidr);
            return Err(e.into());
        }
    };
    info!(
        "Allocated {} subnets in {} across {} zones",
        allocations.len(),
        plan.cidr,
        plan.zones.len()
    );

    let rows = allocations
        .into_iter()
        .map(SubnetRow::from)
        .collect::<Vec<_>>();
    render_rows(&rows, format)
}
