use std::fmt;
use std::str::FromStr;

use crate::protocol::ParseError;

/// The request methods the server answers.
///
/// Any other verb on the wire is a terminal parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl FromStr for Method {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            other => Err(ParseError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_methods() {
        assert_eq!("GET".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("POST".parse::<Method>().unwrap(), Method::Post);
    }

    #[test]
    fn other_verbs_are_rejected() {
        assert_eq!("PUT".parse::<Method>(), Err(ParseError::UnsupportedMethod("PUT".into())));
        // verbs are case sensitive on the wire
        assert!("get".parse::<Method>().is_err());
    }

    #[test]
    fn converts_into_http_method() {
        assert_eq!(http::Method::from(Method::Post), http::Method::POST);
    }
}
