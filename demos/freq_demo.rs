use clap::Parser;
use log::LevelFilter;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use grid_snn::error::SNNError;
use grid_snn::generator;
use grid_snn::harness::Harness;
use grid_snn::nodes::{FreqSensor, Node};
use grid_snn::time::TimeGrid;

#[derive(Parser, Debug)]
struct Args {
    /// The seed used for encoding-spike sampling
    #[arg(long, default_value = "42")]
    seed: u64,
    /// The simulation resolution in ms
    #[arg(long, default_value = "0.1")]
    resolution: f64,
    /// The simulated duration in ms
    #[arg(short = 'T', long, default_value = "500.0")]
    duration: f64,
    /// The encoding spike rate in spikes per ms
    #[arg(long, default_value = "0.05")]
    rate: f64,
    /// The integration window period in ms
    #[arg(long, default_value = "50.0")]
    window: f64,
    /// The log file path
    #[arg(long, default_value = "log/freq_demo.log")]
    log: String,
    /// The recorded-observables output path
    #[arg(long, default_value = "freq_demo.json")]
    out: String,
}

fn main() -> Result<(), SNNError> {
    let args = Args::parse();

    let logfile = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{l} - {m}\n")))
        .build(&args.log)
        .map_err(|e| SNNError::IOError(e.to_string()))?;

    let config = Config::builder()
        .appender(Appender::builder().build("logfile", Box::new(logfile)))
        .build(Root::builder().appender("logfile").build(LevelFilter::Info))
        .map_err(|e| SNNError::IOError(e.to_string()))?;

    log4rs::init_config(config).map_err(|e| SNNError::IOError(e.to_string()))?;

    log::info!("{:?}", args);

    let grid = TimeGrid::build(args.resolution, 10)?;
    let mut net = Harness::new(grid);
    let sensor = net.add_node(Box::new(FreqSensor::new(FreqSensor::recordables())))?;
    net.enable_logging(sensor);

    // periodic integration-window markers on receptor 1
    for t in generator::periodic_train(1.0, args.window, args.duration)? {
        net.schedule_spike(sensor, 1, 1.0, (t / args.resolution) as i64)?;
    }

    // irregular encoding spikes on receptor 2
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let encoding = generator::poisson_train(args.rate, args.duration, &mut rng)?;
    log::info!("Input sampling: done! {} encoding spikes", encoding.len());
    for t in &encoding {
        net.schedule_spike(sensor, 2, 1.0, (t / args.resolution) as i64)?;
    }

    let steps_per_slice = args.resolution * net.grid().min_delay() as f64;
    let num_slices = (args.duration / steps_per_slice).ceil() as usize;
    net.run_slices(num_slices);
    log::info!(
        "Simulation: done! Last detector spike at {:.3} ms",
        net.node(sensor).history().last_spike()
    );

    net.node(sensor).logger().save_to(&args.out)?;
    log::info!("Observables saved to {}", args.out);
    Ok(())
}
