//
// main.rs
//
// texnav: LaTeX file-reference navigation over LSP
//

use std::env;

fn print_usage() {
    println!(
        "texnav {}, a LaTeX file-reference navigation server.",
        env!("CARGO_PKG_VERSION")
    );
    print!(
        r#"
Usage: texnav [OPTIONS]

Available options:

--stdio                      Start the LSP server using stdio transport
--version                    Print the version
--help                       Print this help message

"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut argv = env::args();
    argv.next(); // skip executable name

    let mut use_stdio = false;

    for arg in argv {
        match arg.as_str() {
            "--stdio" => use_stdio = true,
            "--version" => {
                println!("texnav {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_usage();
                return Ok(());
            }
            other => {
                return Err(anyhow::anyhow!("Unknown argument: '{other}'"));
            }
        }
    }

    if !use_stdio {
        print_usage();
        return Ok(());
    }

    env_logger::init();

    texnav::backend::start_lsp().await
}
