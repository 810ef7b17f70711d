use confsel::engine::config::DEFAULT_OPTIMIZER_EXECUTABLE;

pub struct DefaultsConfig {
    pub output_folder: String,
    pub n_best: usize,
    pub charge: i32,
    pub unpaired_electrons: u32,
    pub keep_logs: bool,
    pub shared_workdir: bool,
    pub executable: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_folder: "crest_best_xtbopt".to_string(),
            n_best: 5,
            charge: 0,
            unpaired_electrons: 0,
            keep_logs: false,
            shared_workdir: false,
            executable: DEFAULT_OPTIMIZER_EXECUTABLE.to_string(),
        }
    }
}
