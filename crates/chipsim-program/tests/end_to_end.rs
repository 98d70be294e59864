use chipsim_core::{Chip, QueueMode, SimController};
use chipsim_program::ChipProgrammer;

const PROGRAM: &str = "simcontroller 20\n\
                        neuron 0 0 0 0.5 1.0 100.0 30.0 0 0.0\n";

#[test]
fn parsed_program_runs_to_completion_on_a_single_core_mesh() {
    let mut chip = Chip::new(1, 1, 1000, QueueMode::Fifo).unwrap();
    let outcome = ChipProgrammer::new().program(PROGRAM, &mut chip).unwrap();

    let mut sim = SimController::new(chip);
    sim.run(outcome.tmax).unwrap();

    assert_eq!(sim.timestep(), outcome.tmax);
    assert_eq!(outcome.nrn_id_to_location.len(), 1);
}
