#[allow(non_snake_case)]
pub mod Examples;
#[allow(non_snake_case)]
pub mod Kinetics;
#[allow(non_snake_case)]
pub mod Utils;
pub mod settings;

use Examples::rxn_examples::rxn_examples;
use settings::{DEFAULT_SETTINGS_FILE, KineticsSettings};

pub fn main() {
    //
    let settings = KineticsSettings::load_or_default(DEFAULT_SETTINGS_FILE);
    if let Err(e) = Utils::logging::init_logger(settings.level_filter(), None) {
        eprintln!("{}", e);
    }
    let task: usize = 1;
    rxn_examples(task, &settings);
}
