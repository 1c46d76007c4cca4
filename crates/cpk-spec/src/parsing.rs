// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

//! Parsers for the compact spec request notation.
//!
//! The grammar, by example:
//!
//! ```text
//! mpileaks@2.3:%gcc@9+debug~static fftw=esmtp arch=linux-centos7-x86_64 ^mpich@3.2:
//! ```
//!
//! A request is a package name with optional version range, compiler
//! constraint (`%`), variant constraints (`+v`, `~v`, `v=a,b`), an
//! architecture triple, and any number of `^`-prefixed dependency
//! constraints of the same shape (excluding further nesting).

use cpk_name::{PkgNameBuf, VariantName};
use cpk_version_range::VersionRange;
use nom::branch::alt;
use nom::bytes::complete::take_while1;
use nom::character::complete::{char, multispace1, space0};
use nom::combinator::{map, map_res, opt};
use nom::error::{ContextError, FromExternalError, ParseError};
use nom::multi::many0;
use nom::sequence::{pair, preceded, separated_pair};
use nom::IResult;
use nom_supreme::tag::TagError;

use crate::{Arch, CompilerRequest, SpecRequest, VariantValue};

/// The bounds required of a nom error type by these parsers.
pub trait SpecParseError<'a>:
    ParseError<&'a str>
    + ContextError<&'a str>
    + FromExternalError<&'a str, crate::Error>
    + FromExternalError<&'a str, cpk_name::Error>
    + FromExternalError<&'a str, cpk_version::Error>
    + TagError<&'a str, &'static str>
{
}

impl<'a, E> SpecParseError<'a> for E where
    E: ParseError<&'a str>
        + ContextError<&'a str>
        + FromExternalError<&'a str, crate::Error>
        + FromExternalError<&'a str, cpk_name::Error>
        + FromExternalError<&'a str, cpk_version::Error>
        + TagError<&'a str, &'static str>
{
}

/// Parse a complete spec request, including dependency constraints.
pub fn spec_request<'a, E>(input: &'a str) -> IResult<&'a str, SpecRequest, E>
where
    E: SpecParseError<'a>,
{
    map_res(
        pair(
            base_request,
            many0(preceded(
                pair(multispace1, char('^')),
                base_request,
            )),
        ),
        |(mut request, dependencies)| {
            for dep in dependencies {
                request.add_dependency(dep)?;
            }
            Ok::<_, crate::Error>(request)
        },
    )(input)
}

/// One request without dependency constraints.
fn base_request<'a, E>(input: &'a str) -> IResult<&'a str, SpecRequest, E>
where
    E: SpecParseError<'a>,
{
    map_res(
        pair(
            pair(pkg_name, opt(preceded(char('@'), range))),
            many0(preceded(space0, clause)),
        ),
        |((pkg, version), clauses)| {
            let mut request = SpecRequest::any(pkg);
            request.version = version.unwrap_or_else(VersionRange::any);
            for clause in clauses {
                match clause {
                    Clause::Compiler(compiler) => {
                        if request.compiler.replace(compiler).is_some() {
                            return Err(crate::Error::invalid_request(
                                input,
                                "multiple compiler constraints",
                            ));
                        }
                    }
                    Clause::Arch(arch) => {
                        if request.arch.replace(arch).is_some() {
                            return Err(crate::Error::invalid_request(
                                input,
                                "multiple architecture constraints",
                            ));
                        }
                    }
                    Clause::Variant(name, value) => {
                        if request.variants.insert(name.clone(), value).is_some() {
                            return Err(crate::Error::invalid_request(
                                input,
                                format!("multiple values for variant {name}"),
                            ));
                        }
                    }
                }
            }
            Ok(request)
        },
    )(input)
}

enum Clause {
    Compiler(CompilerRequest),
    Variant(VariantName, VariantValue),
    Arch(Arch),
}

fn clause<'a, E>(input: &'a str) -> IResult<&'a str, Clause, E>
where
    E: SpecParseError<'a>,
{
    alt((
        map(
            preceded(char('%'), pair(pkg_name, opt(preceded(char('@'), range)))),
            |(name, version)| {
                Clause::Compiler(CompilerRequest {
                    name,
                    version: version.unwrap_or_else(VersionRange::any),
                })
            },
        ),
        map(preceded(char('+'), variant_name), |name| {
            Clause::Variant(name, VariantValue::Bool(true))
        }),
        map(preceded(char('~'), variant_name), |name| {
            Clause::Variant(name, VariantValue::Bool(false))
        }),
        key_value_clause,
    ))(input)
}

fn key_value_clause<'a, E>(input: &'a str) -> IResult<&'a str, Clause, E>
where
    E: SpecParseError<'a>,
{
    map_res(
        separated_pair(variant_name, char('='), value_list),
        |(name, value)| {
            if name == *"arch" {
                return Ok(Clause::Arch(value.parse::<Arch>()?));
            }
            Ok::<_, crate::Error>(Clause::Variant(name, VariantValue::from(value)))
        },
    )(input)
}

fn pkg_name<'a, E>(input: &'a str) -> IResult<&'a str, PkgNameBuf, E>
where
    E: SpecParseError<'a>,
{
    map_res(
        take_while1(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
        PkgNameBuf::new,
    )(input)
}

fn variant_name<'a, E>(input: &'a str) -> IResult<&'a str, VariantName, E>
where
    E: SpecParseError<'a>,
{
    map_res(
        take_while1(|c: char| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_')
        }),
        VariantName::new,
    )(input)
}

fn range<'a, E>(input: &'a str) -> IResult<&'a str, VersionRange, E>
where
    E: SpecParseError<'a>,
{
    cpk_version_range::parsing::version_range(input)
}

/// One or more comma-separated variant values, or an arch triple.
fn value_list<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: SpecParseError<'a>,
{
    take_while1(|c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | ','))(input)
}
