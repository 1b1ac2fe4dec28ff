use clap::{Arg, ArgAction, Command};

use practice_pars::analysis::settings::{ExtenderSettings, DEFAULT_NUMBER_OF_SAMPLES, DEFAULT_SAMPLE_SEED};
use practice_pars::demos::models::MODEL_NAMES;
use practice_pars::demos::monotonicity_demo::{monotonicity_demo, validation_demo};
use practice_pars::{error, message};

fn model_arg() -> Arg {
	Arg::new("model")
		.short('m')
		.long("model")
		.value_name("MODEL")
		.help("Built-in model to analyse")
		.value_parser(MODEL_NAMES)
		.default_value("coin")
}

fn region_arg() -> Arg {
	Arg::new("region")
		.short('r')
		.long("region")
		.value_name("REGION")
		.help("Parameter region, e.g. 0.1<=p<=0.9,0.2<=q<=0.8 (defaults to the model's region)")
}

fn main() {
	let matches = Command::new("practice-pars")
		.version("0.1.0")
		.author("Formal Verification Research at Utah State University")
		.about("Order and monotonicity analysis for parametric Markov chains")
		.subcommand_required(true)
		.subcommand(
			Command::new("demo")
				.about("Build the order of a built-in model and report monotonicity")
				.arg(model_arg())
				.arg(region_arg())
				.arg(
					Arg::new("samples")
						.short('s')
						.long("samples")
						.value_name("N")
						.help("Number of samples used to check assumptions (default 10)")
						.value_parser(clap::value_parser!(usize)),
				)
				.arg(
					Arg::new("seed")
						.long("seed")
						.value_name("SEED")
						.help("Seed for the sample points")
						.value_parser(clap::value_parser!(u64)),
				)
				.arg(
					Arg::new("no_assumptions")
						.long("no-assumptions")
						.help("Never make assumptions when the order stalls")
						.action(ArgAction::SetTrue),
				)
				.arg(
					Arg::new("dot")
						.long("dot")
						.help("Print the order in Graphviz format")
						.action(ArgAction::SetTrue),
				),
		)
		.subcommand(
			Command::new("validate")
				.about("Run the sanity checks on a built-in model and region")
				.arg(model_arg())
				.arg(region_arg()),
		)
		.get_matches();

	match matches.subcommand() {
		Some(("demo", sub_m)) => {
			let model = sub_m.get_one::<String>("model").map(String::as_str).unwrap_or("coin");
			let region = sub_m.get_one::<String>("region").map(String::as_str);
			let settings = ExtenderSettings {
				use_assumptions: !sub_m.get_flag("no_assumptions"),
				number_of_samples: sub_m
					.get_one::<usize>("samples")
					.copied()
					.unwrap_or(DEFAULT_NUMBER_OF_SAMPLES),
				sample_seed: sub_m.get_one::<u64>("seed").copied().unwrap_or(DEFAULT_SAMPLE_SEED),
			};
			if let Err(err) = monotonicity_demo(model, region, settings, sub_m.get_flag("dot")) {
				error!("{}", err);
				std::process::exit(1);
			}
		}
		Some(("validate", sub_m)) => {
			let model = sub_m.get_one::<String>("model").map(String::as_str).unwrap_or("coin");
			let region = sub_m.get_one::<String>("region").map(String::as_str);
			match validation_demo(model, region) {
				Ok(true) => message!("All checks passed."),
				Ok(false) => std::process::exit(2),
				Err(err) => {
					error!("{}", err);
					std::process::exit(1);
				}
			}
		}
		_ => unreachable!("clap requires a subcommand"),
	}
}
