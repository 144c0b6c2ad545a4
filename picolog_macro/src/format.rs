// Copyright 2025 The Pigweed Authors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy of
// the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations under
// the License.

//! Format string validation.
//!
//! Placeholders are brace-delimited and may carry a display spec the host
//! interprets (`{}`, `{.2%}`, `{.<4f}`); `{{` and `}}` escape literal
//! braces.  The device never parses the string at runtime - the only job
//! here is counting placeholders so argument arity mismatches fail the
//! build.

use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, take_while};
use nom::character::complete::char;
use nom::combinator::value;
use nom::multi::fold_many0;
use nom::sequence::delimited;
use nom::IResult;

fn escape(input: &str) -> IResult<&str, usize> {
    value(0, alt((tag("{{"), tag("}}"))))(input)
}

fn placeholder(input: &str) -> IResult<&str, usize> {
    value(
        1,
        delimited(char('{'), take_while(|c| c != '{' && c != '}'), char('}')),
    )(input)
}

fn text(input: &str) -> IResult<&str, usize> {
    value(0, is_not("{}"))(input)
}

/// Counts the placeholders in `fmt`, or describes why it is malformed.
pub(crate) fn count_placeholders(fmt: &str) -> Result<usize, String> {
    let mut parser = fold_many0(
        alt((escape, placeholder, text)),
        || 0usize,
        |count, n| count + n,
    );
    match parser(fmt) {
        Ok(("", count)) => Ok(count),
        Ok((rest, _)) => Err(format!("unbalanced braces in format string near `{rest}`")),
        Err(_) => Err("malformed format string".to_string()),
    }
}
