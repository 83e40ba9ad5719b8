// route.rs — Show how a message would be classified and routed.

use sp_coordinator::{classify_intent, route_for};

pub fn run(message: &str) -> anyhow::Result<()> {
    let intent = classify_intent(message);
    println!("intent: {:?}", intent);

    match route_for(intent) {
        Some(route) => {
            println!(
                "agents: {} ({})",
                route.agents.join(" -> "),
                if route.parallel { "parallel" } else { "sequential" }
            );
        }
        None => {
            println!("agents: (ambiguous: the coordinator would ask the planner model)");
        }
    }
    Ok(())
}
