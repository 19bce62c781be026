pub(crate) mod io;

pub use io::{
    CATEGORY_FILE_NAME, CONFIG_ENV, CONFIG_FILE_NAME, default_category_config,
    load_category_config, load_category_config_file, load_config, load_config_file,
};
