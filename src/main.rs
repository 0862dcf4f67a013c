use tokenwind::run_from_env;

fn main() {
    if let Err(err) = run_from_env() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
