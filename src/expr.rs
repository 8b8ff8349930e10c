//! Scalar expression evaluation for magnetization directions
//!
//! Block labels may give the magnetization direction as an expression in
//! the element-centroid bindings `x`, `y`, `r` (= x), `z` (= y), `theta`
//! (centroid angle in degrees) and `R` (centroid radius), evaluated once
//! per element at load. The grammar covers what such expressions actually
//! use: the four arithmetic operators, `^`, parentheses, unary minus, and
//! a handful of math functions (radian-argument trig, as in the solver's
//! embedded interpreter).

/// A named value available to the expression
#[derive(Debug, Clone, Copy)]
pub struct Binding<'a> {
    pub name: &'a str,
    pub value: f64,
}

/// Errors raised while parsing or evaluating an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprError {
    pub message: String,
}

impl std::fmt::Display for ExprError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExprError {}

/// Evaluate `src` with the given variable bindings
pub fn eval(src: &str, bindings: &[Binding]) -> Result<f64, ExprError> {
    let mut p = Parser {
        src: src.as_bytes(),
        pos: 0,
        bindings,
    };
    let v = p.expr()?;
    p.skip_ws();
    if p.pos != p.src.len() {
        return Err(p.err("trailing characters after expression"));
    }
    Ok(v)
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
    bindings: &'a [Binding<'a>],
}

impl<'a> Parser<'a> {
    fn err(&self, message: &str) -> ExprError {
        ExprError {
            message: format!("{} at offset {}", message, self.pos),
        }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.src.len() && self.src[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.src.get(self.pos).copied()
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<f64, ExprError> {
        let mut v = self.term()?;
        loop {
            if self.eat(b'+') {
                v += self.term()?;
            } else if self.eat(b'-') {
                v -= self.term()?;
            } else {
                return Ok(v);
            }
        }
    }

    fn term(&mut self) -> Result<f64, ExprError> {
        let mut v = self.factor()?;
        loop {
            if self.eat(b'*') {
                v *= self.factor()?;
            } else if self.eat(b'/') {
                v /= self.factor()?;
            } else {
                return Ok(v);
            }
        }
    }

    fn factor(&mut self) -> Result<f64, ExprError> {
        if self.eat(b'-') {
            return Ok(-self.factor()?);
        }
        if self.eat(b'+') {
            return self.factor();
        }
        let base = self.primary()?;
        // right-associative exponentiation
        if self.eat(b'^') {
            let exp = self.factor()?;
            return Ok(base.powf(exp));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, ExprError> {
        match self.peek() {
            Some(b'(') => {
                self.pos += 1;
                let v = self.expr()?;
                if !self.eat(b')') {
                    return Err(self.err("expected ')'"));
                }
                Ok(v)
            }
            Some(c) if c.is_ascii_digit() || c == b'.' => self.number(),
            Some(c) if c.is_ascii_alphabetic() || c == b'_' => self.ident(),
            _ => Err(self.err("expected a value")),
        }
    }

    fn number(&mut self) -> Result<f64, ExprError> {
        self.skip_ws();
        let start = self.pos;
        while self.pos < self.src.len()
            && (self.src[self.pos].is_ascii_digit() || self.src[self.pos] == b'.')
        {
            self.pos += 1;
        }
        // exponent part
        if self.pos < self.src.len() && (self.src[self.pos] | 0x20) == b'e' {
            let mark = self.pos;
            self.pos += 1;
            if self.pos < self.src.len() && (self.src[self.pos] == b'+' || self.src[self.pos] == b'-')
            {
                self.pos += 1;
            }
            if self.pos < self.src.len() && self.src[self.pos].is_ascii_digit() {
                while self.pos < self.src.len() && self.src[self.pos].is_ascii_digit() {
                    self.pos += 1;
                }
            } else {
                self.pos = mark;
            }
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap();
        text.parse::<f64>()
            .map_err(|_| self.err("malformed number"))
    }

    fn ident(&mut self) -> Result<f64, ExprError> {
        self.skip_ws();
        let start = self.pos;
        while self.pos < self.src.len()
            && (self.src[self.pos].is_ascii_alphanumeric() || self.src[self.pos] == b'_')
        {
            self.pos += 1;
        }
        let name = std::str::from_utf8(&self.src[start..self.pos]).unwrap();

        if self.eat(b'(') {
            let arg = self.expr()?;
            if !self.eat(b')') {
                return Err(self.err("expected ')' after function argument"));
            }
            return match name {
                "sin" => Ok(arg.sin()),
                "cos" => Ok(arg.cos()),
                "tan" => Ok(arg.tan()),
                "asin" => Ok(arg.asin()),
                "acos" => Ok(arg.acos()),
                "atan" => Ok(arg.atan()),
                "sqrt" => Ok(arg.sqrt()),
                "exp" => Ok(arg.exp()),
                "log" => Ok(arg.ln()),
                "abs" => Ok(arg.abs()),
                _ => Err(self.err("unknown function")),
            };
        }

        if name == "pi" {
            return Ok(std::f64::consts::PI);
        }
        for b in self.bindings {
            if b.name == name {
                return Ok(b.value);
            }
        }
        Err(self.err("unknown variable"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ev(src: &str) -> f64 {
        eval(
            src,
            &[
                Binding { name: "x", value: 3.0 },
                Binding { name: "y", value: 4.0 },
                Binding { name: "theta", value: 30.0 },
                Binding { name: "R", value: 5.0 },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_arithmetic() {
        assert_relative_eq!(ev("1 + 2*3"), 7.0);
        assert_relative_eq!(ev("(1 + 2)*3"), 9.0);
        assert_relative_eq!(ev("-x + y/2"), -1.0);
        assert_relative_eq!(ev("2^3^1"), 8.0);
        assert_relative_eq!(ev("1.5e2 / 3"), 50.0);
    }

    #[test]
    fn test_bindings_and_functions() {
        assert_relative_eq!(ev("sqrt(x*x + y*y)"), 5.0);
        assert_relative_eq!(ev("theta + 90"), 120.0);
        assert_relative_eq!(ev("R*cos(0)"), 5.0);
        assert_relative_eq!(ev("abs(-theta)"), 30.0);
    }

    #[test]
    fn test_errors() {
        assert!(eval("2 +", &[]).is_err());
        assert!(eval("bogus", &[]).is_err());
        assert!(eval("sin(1", &[]).is_err());
        assert!(eval("1 2", &[]).is_err());
    }
}
