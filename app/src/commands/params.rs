//! Parameter listing.

use equwu_core::{ParameterId, ParameterStore, Slope};

pub fn run() -> anyhow::Result<()> {
    let defaults = ParameterStore::new();

    println!(
        "{:<18} {:>9} {:>9} {:>7} {:>9} {:>9}",
        "Parameter", "Min", "Max", "Step", "Default", "(0-1)"
    );
    for id in ParameterId::ALL {
        let range = id.range();
        println!(
            "{:<18} {:>9} {:>9} {:>7} {:>9} {:>9.3}",
            id.id(),
            range.min,
            range.max,
            range.interval,
            range.default,
            defaults.get_normalized(id)
        );
    }

    println!("\nSlope choices:");
    for slope in Slope::ALL {
        println!("  {} = {}", slope.index(), slope.label());
    }
    Ok(())
}
