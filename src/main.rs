use texflow::prelude::*;

fn main() {
    env_logger::init();

    let result = Simulation::new(PointSet::uv_sphere(3.0, 128, 64))
        .with_title("texflow - flow field")
        .with_base_point_size(0.4)
        .with_state_preview(true)
        .run();

    if let Err(err) = result {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
