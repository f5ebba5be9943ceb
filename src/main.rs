use kllc::{compile, emitters, CancelFlag, CompileRequest, Diagnostics, EmitterKind, Filestore};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "kllc", about = "KLL (Keyboard Layout Language) Compiler")]
struct Opt {
    /// Miscellaneous kll files (lowest precedence)
    #[structopt(long, parse(from_os_str))]
    generic: Vec<PathBuf>,

    /// Configuration kll files
    #[structopt(long, parse(from_os_str))]
    config: Vec<PathBuf>,

    /// BaseMap kll files
    #[structopt(long, parse(from_os_str))]
    base: Vec<PathBuf>,

    /// DefaultMap kll files (layer 0)
    #[structopt(long = "default", parse(from_os_str))]
    defaults: Vec<PathBuf>,

    /// PartialMap kll files; each occurrence adds one layer
    #[structopt(long, parse(from_os_str))]
    partial: Vec<PathBuf>,

    /// Explicit merge kll files (highest precedence)
    #[structopt(long, parse(from_os_str))]
    merge: Vec<PathBuf>,

    /// Emitter backend: kll, json or none
    #[structopt(long, default_value = "kll")]
    emitter: EmitterKind,

    /// Output path for the selected emitter (stdout if omitted)
    #[structopt(long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Additionally write the JSON dump to this path
    #[structopt(long, parse(from_os_str))]
    json_output: Option<PathBuf>,
}

fn run() -> i32 {
    let opt = Opt::from_args();
    let request = CompileRequest {
        generic_files: opt.generic,
        config_files: opt.config,
        base_files: opt.base,
        default_files: opt.defaults,
        partial_groups: opt.partial.into_iter().map(|path| vec![path]).collect(),
        merge_files: opt.merge,
        emitter: opt.emitter,
        output: opt.output,
        json_output: opt.json_output,
    };

    let mut filestore = Filestore::new();
    for path in request.all_files() {
        if let Err(err) = filestore.load_file(path) {
            eprintln!("{}", err);
            return 1;
        }
    }

    let mut diag = Diagnostics::new();
    let cancel = CancelFlag::default();
    match compile(&filestore, &request, &cancel, &mut diag) {
        Ok((merged, data)) => {
            for warning in &diag.warnings {
                eprintln!("{}", warning);
            }
            if let Err(err) = emitters::emit(
                request.emitter,
                &merged,
                &data,
                request.output.as_deref(),
            ) {
                eprintln!("{}", err);
                return if err.is_internal() { 2 } else { 1 };
            }
            if let Some(path) = &request.json_output {
                if request.emitter != EmitterKind::Json {
                    if let Err(err) = emitters::json::write(&merged, &data, Some(path)) {
                        eprintln!("{}", err);
                        return if err.is_internal() { 2 } else { 1 };
                    }
                }
            }
            0
        }
        Err(err) => {
            for error in &diag.errors {
                eprintln!("{}", error);
            }
            for warning in &diag.warnings {
                eprintln!("{}", warning);
            }
            if !matches!(err, kllc::Error::Failed(_)) {
                eprintln!("{}", err);
            }
            if err.is_internal() {
                2
            } else {
                1
            }
        }
    }
}

fn main() {
    std::process::exit(run());
}
