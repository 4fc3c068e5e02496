use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 23] = [
        "RUST_LOG",
        "CHK_HOST",
        "CHK_PORT",
        "CHK_DATABASE_URL",
        "CHK_CLIENT_URL",
        "CHK_SHOP_CURRENCY",
        "CHK_CARD_CURRENCY",
        "CHK_INVOICE_DESCRIPTION",
        "CHK_LENIENT_TRANSITIONS",
        "CHK_VERIFY_PRICES",
        "CHK_EVENT_BUFFER_SIZE",
        "CHK_RECONCILE_INTERVAL_SECS",
        "CHK_RECONCILE_AFTER_MINS",
        "CHK_BTCPAY_HMAC_CHECKS",
        "CHK_BTCPAY_URL",
        "CHK_BTCPAY_STORE_ID",
        "CHK_STRIPE_API_URL",
        "CHK_TELEGRAM_API_URL",
        "CHK_TELEGRAM_CHAT_ID",
        "CHK_EMAIL_CATEGORIES",
        "CHK_CHAT_CATEGORIES",
        "CHK_EMAIL_FROM",
        "CHK_ADMIN_EMAIL",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
