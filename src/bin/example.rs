//! Stringer-Panel Example - Wall panel under increasing tension and shear

use anyhow::Context;
use stringer_panel::prelude::*;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("=== Stringer-Panel Example: Wall Panel ===\n");

    // One 1000 x 1000 mm panel framed by four stringers
    //
    //     7 ---- 6 ---- 5
    //     |             |
    //     8             4
    //     |             |
    //     1 ---- 2 ---- 3
    //     ^      ^
    //   Fixed  Fixed y
    //
    let mut model = PanelModel::new();
    model.set_concrete(Concrete::from_fcm(30.0, 16.0));
    model.set_steel(Steel::b500());

    let coords = [
        (0.0, 0.0),
        (500.0, 0.0),
        (1000.0, 0.0),
        (1000.0, 500.0),
        (1000.0, 1000.0),
        (500.0, 1000.0),
        (0.0, 1000.0),
        (0.0, 500.0),
    ];
    for (i, &(x, y)) in coords.iter().enumerate() {
        let node = match i {
            0 => Node::new(1, x, y).with_support(true, true),
            1 => Node::new(2, x, y).with_support(false, true),
            _ => Node::new(i + 1, x, y),
        };
        model.add_node(node)?;
    }

    // 200 x 200 mm stringers with 4 bars of 12 mm
    for (number, [start, mid, end]) in [[1, 2, 3], [3, 4, 5], [5, 6, 7], [7, 8, 1]]
        .into_iter()
        .enumerate()
    {
        model.add_stringer(Stringer::new(number + 1, start, mid, end, 40_000.0).with_bars(4, 12.0))?;
    }

    // 200 mm wall, 16 mm bars at 100 mm both ways
    let mesh = Reinforcement::new(16.0, 100.0, 25.0);
    model.add_panel(Panel::new(1, [1, 3, 5, 7], 200.0).with_reinforcement(mesh, mesh))?;
    model.prepare().context("model input rejected")?;

    println!("Nodes: {}", model.nodes.len());
    println!("Stringers: {}", model.stringers.len());
    println!("Panels: {}", model.panels.len());
    println!("DoFs: {}", model.num_dofs());

    // Step the panel stress through cracking
    // per-iteration trace output shows with RUST_LOG=trace
    let options = SolverOptions::default().with_logging();
    println!("\n--- Membrane Load Steps ---");
    println!(
        "{:>5} {:>8} {:>8} {:>12} {:>12} {:>9} {:>9} {:>6}",
        "Step", "σx", "τxy", "e1", "e2", "fc1", "fc2", "Iter"
    );
    for step in 1..=8 {
        let sigma = 0.5 * step as f64;
        let stress = Vec3::new(sigma, 0.0, 0.5 * sigma);
        let membrane = match model.solve_panel(1, stress, step, &options) {
            Ok(m) => m,
            Err(e) => {
                println!("Step {step} stopped: {e}");
                break;
            }
        };
        println!(
            "{:>5} {:>8.2} {:>8.2} {:>12.4e} {:>12.4e} {:>9.3} {:>9.3} {:>6}",
            step,
            stress[0],
            stress[2],
            membrane.e1,
            membrane.e2,
            membrane.fc1,
            membrane.fc2,
            membrane.iterations
        );
    }

    println!("\n--- Limit States (load step, 0 = not reached) ---");
    println!("{:>6} {:>6} {:>8} {:>8} {:>6}", "Panel", "Crack", "Yield x", "Yield y", "Peak");
    for summary in model.limit_state_summary() {
        println!(
            "{:>6} {:>6} {:>8} {:>8} {:>6}",
            summary.panel, summary.crack, summary.yield_x, summary.yield_y, summary.peak
        );
    }

    // Stringer stiffness blocks for the external assembler
    model
        .update_stringer_stiffnesses()
        .context("stringer stiffness derivation failed")?;
    println!("\n--- Stringer Stiffness (global) ---");
    for (indexes, k) in model.stringer_stiffnesses()? {
        println!("DoFs {:?}: k[0,0] = {:.1} N/mm", indexes, k[(0, 0)]);
    }

    // Read back a displacement vector as produced by a global solve
    let u: Vec<f64> = (0..model.num_dofs())
        .map(|i| if i % 2 == 0 { 1.0e-3 * i as f64 } else { 0.0 })
        .collect();
    let displacements = model.extract_displacements(&u)?;
    let forces = model.update_stringer_forces(&u)?;

    println!("\n--- Stringer Forces ---");
    for (number, f) in &forces {
        println!(
            "Stringer {}: N1 = {:.1} N, N3 = {:.1} N, max |N| = {:.1} N",
            number,
            f.n1,
            f.n3,
            f.max_abs()
        );
    }

    if let Some(largest) = displacements
        .iter()
        .max_by(|a, b| a.magnitude().total_cmp(&b.magnitude()))
    {
        println!(
            "\nLargest displacement: node {} ({:.6} mm)",
            largest.number,
            largest.magnitude()
        );
    }

    println!("\n--- JSON Output ---");
    let output = serde_json::json!({
        "limit_states": model.limit_state_summary(),
        "membranes": model.membrane_results(),
        "displacements": displacements,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    println!("\n=== Analysis Complete ===");
    Ok(())
}
