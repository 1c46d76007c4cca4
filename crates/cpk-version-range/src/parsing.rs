// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use cpk_version::Version;
use nom::branch::alt;
use nom::bytes::complete::take_while1;
use nom::character::complete::char;
use nom::combinator::{map, map_res, opt};
use nom::error::{ContextError, FromExternalError, ParseError};
use nom::multi::separated_list1;
use nom::sequence::{preceded, separated_pair};
use nom::IResult;
use nom_supreme::tag::complete::tag;
use nom_supreme::tag::TagError;

use crate::{
    EqualsVersion, IntervalRange, NotEqualsVersion, PrefixRange, VersionFilter, VersionRange,
};

/// Parse a version number embedded in a range expression.
///
/// Range separators (`:` and `,`) terminate the version, which
/// means that pre/post tag sets with multiple tags cannot appear
/// inside a range expression.
pub fn version<'a, E>(input: &'a str) -> IResult<&'a str, Version, E>
where
    E: ParseError<&'a str> + FromExternalError<&'a str, cpk_version::Error>,
{
    map_res(
        take_while1(|c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+')),
        cpk_version::parse_version,
    )(input)
}

/// Parse a version range expression, eg: `1.2:1.9,2.1`.
///
/// A comma-separated list becomes a union filter; each member is
/// an equality (`=1.2.3`), an exclusion (`!=1.2.3`), a bounded or
/// half-open interval (`1.2:1.9`, `1.2:`, `:1.9`, `:`), or a bare
/// version prefix (`1.2`).
pub fn version_range<'a, E>(input: &'a str) -> IResult<&'a str, VersionRange, E>
where
    E: ParseError<&'a str>
        + ContextError<&'a str>
        + FromExternalError<&'a str, cpk_version::Error>
        + TagError<&'a str, &'static str>,
{
    map(
        separated_list1(char(','), simple_range),
        |mut rules: Vec<VersionRange>| {
            if rules.len() == 1 {
                rules.remove(0)
            } else {
                VersionRange::Filter(VersionFilter::new(rules))
            }
        },
    )(input)
}

fn simple_range<'a, E>(input: &'a str) -> IResult<&'a str, VersionRange, E>
where
    E: ParseError<&'a str>
        + ContextError<&'a str>
        + FromExternalError<&'a str, cpk_version::Error>
        + TagError<&'a str, &'static str>,
{
    alt((
        map(preceded(tag("!="), version), |v| {
            VersionRange::NotEquals(NotEqualsVersion::new(v))
        }),
        map(preceded(char('='), version), |v| {
            VersionRange::Equals(EqualsVersion::new(v))
        }),
        map(
            separated_pair(opt(version), char(':'), opt(version)),
            |(minimum, maximum)| VersionRange::Interval(IntervalRange { minimum, maximum }),
        ),
        map(version, |v| VersionRange::Prefix(PrefixRange::new(v))),
    ))(input)
}
