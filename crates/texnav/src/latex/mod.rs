//
// latex/mod.rs
//
// Lightweight LaTeX source inspection
//

pub mod scanner;

pub use scanner::*;

/// Whether the scanned document declares a document class, making it a root document.
pub fn declares_document_class(invocations: &[CommandInvocation]) -> bool {
    invocations
        .iter()
        .any(|inv| inv.command_name() == Some("documentclass"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declares_document_class() {
        let main = scan_commands("\\documentclass{article}\n\\begin{document}\\end{document}");
        assert!(declares_document_class(&main));

        let chapter = scan_commands("\\section{Intro}\n\\input{details}");
        assert!(!declares_document_class(&chapter));
    }

    #[test]
    fn test_commented_document_class_does_not_count() {
        let text = "% \\documentclass{article}\n\\section{x}";
        assert!(!declares_document_class(&scan_commands(text)));
    }
}
