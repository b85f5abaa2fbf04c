// src/banner.rs
use crate::config::AppConfig;

/// Prints the application startup banner to the console.
pub fn print_banner(config: &AppConfig) {
    let banner = r#"
     _                                              _
 ___(_) __ _ _ __  _   _ _ __    _ __ ___| | __ _ _   _
/ __| |/ _` | '_ \| | | | '_ \  | '__/ _ \ |/ _` | | | |
\__ \ | (_| | | | | |_| | |_) | | | |  __/ | (_| | |_| |
|___/_|\__, |_| |_|\__,_| .__/  |_|  \___|_|\__,_|\__, |
       |___/            |_|                       |___/

    Registration form relay
"#;
    println!("{}", banner);
    println!("  remote    : {}{}", config.remote.api_base, config.remote.users_path);
    match config.remote.timeout_secs {
        Some(secs) => println!("  timeout   : {}s", secs),
        None => println!("  timeout   : none (remote decides)"),
    }
    match config.cache.ttl_secs {
        Some(secs) => println!("  view ttl  : {}s", secs),
        None => println!("  view ttl  : until invalidated"),
    }
    println!();
}
