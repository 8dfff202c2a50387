use crate::memory::RecordingRam;
use crate::simulator::Simulator;
use crate::util::trace_reader;

mod access;
mod hierarchy;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Replays a pattern on a freshly cleared simulator, returning the memory events it produced
fn run_pattern(simulator: &mut Simulator<RecordingRam>, pattern: &[String]) -> Vec<String> {
    let hierarchy = simulator.hierarchy_mut();
    hierarchy.clear();
    hierarchy.ram_mut().take_events();
    simulator.simulate(trace_reader(pattern)).unwrap();
    simulator.hierarchy().ram().lines()
}
