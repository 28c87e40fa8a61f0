// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Expr, Ref};
use crate::builtins::utils::{ensure_string, function_error, mismatch, target_text};
use crate::builtins::MethodImpl;
use crate::error::EvalResult;
use crate::lexer::Span;
use crate::registry::{Example, MethodCategory, MethodSpec, Registry, RegistryError};
use crate::value::Value;

use data_encoding::{
    Encoding, BASE32, BASE32HEX, BASE64, BASE64URL, BASE64URL_NOPAD, HEXLOWER_PERMISSIVE,
};

const SCHEMES: &str = "base64, base64url, base64rawurl, hex, base32, base32hex";

pub fn register(r: &mut Registry) -> Result<(), RegistryError> {
    use MethodCategory::Encoding;

    r.register_method(
        MethodSpec::new("encode", MethodImpl::Eager(encode))
            .description(&format!(
                "Encodes a string or bytes with a scheme. Available schemes are: {SCHEMES}."
            ))
            .param("scheme", "The encoding scheme.")
            .in_category(Encoding, "", vec![])
            .example(Example::new(
                "",
                r#"root.encoded = this.value.encode("hex")"#,
                &[(r#"{"value":"hello world"}"#, r#"{"encoded":"68656c6c6f20776f726c64"}"#)],
            ))
            .example(Example::new(
                "",
                r#"root.encoded = this.value.encode("base64")"#,
                &[(r#"{"value":"hello world"}"#, r#"{"encoded":"aGVsbG8gd29ybGQ="}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("decode", MethodImpl::Eager(decode))
            .description(&format!(
                "Decodes an encoded string into bytes. Available schemes are: {SCHEMES}."
            ))
            .param("scheme", "The encoding scheme.")
            .in_category(Encoding, "", vec![])
            .example(Example::new(
                "",
                r#"root.decoded = this.value.decode("hex").string()"#,
                &[(r#"{"value":"68656c6c6f20776f726c64"}"#, r#"{"decoded":"hello world"}"#)],
            ))
            .example(Example::new(
                "",
                r#"root = this.encoded.decode("base64").string()"#,
                &[(r#"{"encoded":"aGVsbG8gd29ybGQ="}"#, r#""hello world""#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("escape_url_query", MethodImpl::Eager(escape_url_query))
            .description("Escapes a string so that it can be placed inside a URL query.")
            .in_category(Encoding, "", vec![])
            .example(Example::new(
                "",
                "root.escaped = this.value.escape_url_query()",
                &[(r#"{"value":"foo & bar"}"#, r#"{"escaped":"foo+%26+bar"}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("unescape_url_query", MethodImpl::Eager(unescape_url_query))
            .description("Reverses `escape_url_query`.")
            .in_category(Encoding, "", vec![])
            .example(Example::new(
                "",
                "root.unescaped = this.value.unescape_url_query()",
                &[(r#"{"value":"foo+%26+bar"}"#, r#"{"unescaped":"foo & bar"}"#)],
            )),
    )?;
    Ok(())
}

fn scheme(fcn: &str, params: &[Ref<Expr>], args: &[Value]) -> EvalResult<Encoding> {
    let name = ensure_string(fcn, params, 0, &args[0])?;
    Ok(match name.as_ref() {
        "base64" => BASE64,
        "base64url" => BASE64URL,
        "base64rawurl" => BASE64URL_NOPAD,
        "hex" => HEXLOWER_PERMISSIVE,
        "base32" => BASE32,
        "base32hex" => BASE32HEX,
        _ => {
            return Err(function_error(
                fcn,
                params[0].span(),
                format!("unrecognized encoding scheme `{name}`, expected one of: {SCHEMES}"),
            ))
        }
    })
}

fn encode(span: &Span, params: &[Ref<Expr>], target: &Value, args: &[Value]) -> EvalResult {
    let encoding = scheme("encode", params, args)?;
    let bytes = match target {
        Value::String(_) | Value::Bytes(_) => target.to_bytes(),
        _ => return Err(mismatch("encode", span, None, "string or bytes", target)),
    };
    Ok(Value::from(encoding.encode(&bytes)))
}

fn decode(span: &Span, params: &[Ref<Expr>], target: &Value, args: &[Value]) -> EvalResult {
    let encoding = scheme("decode", params, args)?;
    let text = target_text("decode", span, target)?;
    match encoding.decode(text.as_bytes()) {
        Ok(bytes) => Ok(Value::from(bytes)),
        Err(e) => Err(function_error("decode", span, e.to_string())),
    }
}

fn escape_url_query(
    span: &Span,
    _params: &[Ref<Expr>],
    target: &Value,
    _args: &[Value],
) -> EvalResult {
    let text = target_text("escape_url_query", span, target)?;
    Ok(Value::from(
        url::form_urlencoded::byte_serialize(text.as_bytes()).collect::<String>(),
    ))
}

fn hex_digit(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

fn unescape_url_query(
    span: &Span,
    _params: &[Ref<Expr>],
    target: &Value,
    _args: &[Value],
) -> EvalResult {
    let text = target_text("unescape_url_query", span, target)?;
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'+' => out.push(b' '),
            b'%' => {
                let hi = bytes.get(idx + 1).copied().and_then(hex_digit);
                let lo = bytes.get(idx + 2).copied().and_then(hex_digit);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => out.push(hi << 4 | lo),
                    _ => {
                        let end = (idx + 3).min(bytes.len());
                        let escape = String::from_utf8_lossy(&bytes[idx..end]);
                        return Err(function_error(
                            "unescape_url_query",
                            span,
                            format!("invalid escape `{escape}`"),
                        ));
                    }
                }
                idx += 2;
            }
            b => out.push(b),
        }
        idx += 1;
    }
    Ok(Value::from(String::from_utf8_lossy(&out).into_owned()))
}
