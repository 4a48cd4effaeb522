//! Helpers to parse and print emitted modules with swc.
use swc_common::{sync::Lrc, FileName, SourceFile, SourceMap};
use swc_ecma_ast::Script;
use swc_ecma_codegen::{text_writer::JsWriter, Config, Emitter};
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax};

use crate::error::{Error, Result};

pub(crate) fn get_parser<'a>(
    fm: &'a SourceFile,
) -> Parser<Lexer<'a, StringInput<'a>>> {
    let lexer = Lexer::new(
        // We want to parse ecmascript
        Syntax::Es(Default::default()),
        // JscTarget defaults to es5
        Default::default(),
        StringInput::from(fm),
        None,
    );
    Parser::new_from(lexer)
}

/// Parse loader output as a script.
///
/// Emitted modules contain no import or export declarations so they
/// must parse as a classic script.
pub(crate) fn parse_script(
    code: &str,
    identifier: &str,
) -> Result<(Lrc<SourceMap>, Script)> {
    let sm: Lrc<SourceMap> = Default::default();
    let fm = sm.new_source_file(
        FileName::Custom(identifier.to_string()),
        code.to_string(),
    );

    let mut parser = get_parser(&*fm);
    let script = parser.parse_script().map_err(|e| Error::Minify {
        identifier: identifier.to_string(),
        message: format!("{:?}", e),
    })?;

    // Recoverable errors still mean the output is not valid for the loader.
    if let Some(e) = parser.take_errors().into_iter().next() {
        return Err(Error::Minify {
            identifier: identifier.to_string(),
            message: format!("{:?}", e),
        });
    }

    Ok((sm, script))
}

/// Print a script with whitespace and comments removed.
pub(crate) fn print_minified(
    sm: Lrc<SourceMap>,
    script: &Script,
    identifier: &str,
) -> Result<String> {
    let mut buf = Vec::new();
    {
        let mut emitter = Emitter {
            cfg: Config {
                minify: true,
                ..Default::default()
            },
            cm: sm.clone(),
            comments: None,
            wr: Box::new(JsWriter::new(sm, "\n", &mut buf, None)),
        };
        emitter.emit_script(script).map_err(|e| Error::Minify {
            identifier: identifier.to_string(),
            message: e.to_string(),
        })?;
    }
    String::from_utf8(buf).map_err(|e| Error::Minify {
        identifier: identifier.to_string(),
        message: e.to_string(),
    })
}

/// Minify emitted module text.
pub fn minify(code: &str, identifier: &str) -> Result<String> {
    let (sm, script) = parse_script(code, identifier)?;
    print_minified(sm, &script, identifier)
}
