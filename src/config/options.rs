//! Solver options for the global linear systems.
//!
//! `SolverOptions` selects the global system variant, the Krylov method and preconditioner
//! of the iterative variants, and their stopping criteria. Every enum parses from the names
//! used in session files, so options can be read from any key/value source.

use crate::error::LinSysError;
use std::fmt;
use std::str::FromStr;

/// Strategy used to solve the assembled system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GlobalLinSysKind {
    /// Assemble and factor the complete operator, interior dofs included.
    DirectFull,
    /// Condense interiors, then assemble and factor the boundary Schur complement.
    DirectStaticCond,
    /// Krylov solve of the complete operator, applied element by element.
    IterativeFull,
    /// Krylov solve of the Schur complement, applied element by element.
    IterativeStaticCond,
}

impl GlobalLinSysKind {
    pub const ALL: [GlobalLinSysKind; 4] = [
        GlobalLinSysKind::DirectFull,
        GlobalLinSysKind::DirectStaticCond,
        GlobalLinSysKind::IterativeFull,
        GlobalLinSysKind::IterativeStaticCond,
    ];

    pub fn is_static_cond(self) -> bool {
        matches!(
            self,
            GlobalLinSysKind::DirectStaticCond | GlobalLinSysKind::IterativeStaticCond
        )
    }

    pub fn is_iterative(self) -> bool {
        matches!(
            self,
            GlobalLinSysKind::IterativeFull | GlobalLinSysKind::IterativeStaticCond
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            GlobalLinSysKind::DirectFull => "DirectFull",
            GlobalLinSysKind::DirectStaticCond => "DirectStaticCond",
            GlobalLinSysKind::IterativeFull => "IterativeFull",
            GlobalLinSysKind::IterativeStaticCond => "IterativeStaticCond",
        }
    }
}

impl fmt::Display for GlobalLinSysKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GlobalLinSysKind {
    type Err = LinSysError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GlobalLinSysKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                LinSysError::Configuration(format!("unknown global system type '{s}'"))
            })
    }
}

/// Preconditioner of the iterative variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreconditionerKind {
    Null,
    #[default]
    Diagonal,
}

impl FromStr for PreconditionerKind {
    type Err = LinSysError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "null" | "none" => Ok(PreconditionerKind::Null),
            "diagonal" | "jacobi" => Ok(PreconditionerKind::Diagonal),
            _ => Err(LinSysError::Configuration(format!(
                "unknown preconditioner '{s}'"
            ))),
        }
    }
}

/// Krylov method of the iterative variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KrylovMethod {
    Pcg,
    Gmres,
}

impl FromStr for KrylovMethod {
    type Err = LinSysError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pcg" | "cg" | "conjugategradient" => Ok(KrylovMethod::Pcg),
            "gmres" => Ok(KrylovMethod::Gmres),
            _ => Err(LinSysError::Configuration(format!(
                "unknown iterative solver '{s}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    pub kind: GlobalLinSysKind,
    pub preconditioner: PreconditionerKind,
    /// `None` picks PCG for symmetric operators and GMRES otherwise.
    pub krylov: Option<KrylovMethod>,
    /// Relative residual tolerance.
    pub tol: f64,
    pub max_iters: usize,
    /// GMRES restart length.
    pub restart: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            kind: GlobalLinSysKind::DirectStaticCond,
            preconditioner: PreconditionerKind::Diagonal,
            krylov: None,
            tol: 1e-9,
            max_iters: 5000,
            restart: 30,
        }
    }
}

impl SolverOptions {
    pub fn new(kind: GlobalLinSysKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn with_preconditioner(mut self, preconditioner: PreconditionerKind) -> Self {
        self.preconditioner = preconditioner;
        self
    }

    pub fn with_krylov(mut self, method: KrylovMethod) -> Self {
        self.krylov = Some(method);
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    pub fn with_restart(mut self, restart: usize) -> Self {
        self.restart = restart;
        self
    }

    /// Set one option from a `name`/`value` pair.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), LinSysError> {
        let bad_value = || {
            LinSysError::Configuration(format!("invalid value '{value}' for option '{name}'"))
        };
        match name {
            "GlobalSysSoln" => self.kind = value.parse()?,
            "Preconditioner" => self.preconditioner = value.parse()?,
            "LinSysIterSolver" => self.krylov = Some(value.parse()?),
            "IterativeSolverTolerance" => {
                self.tol = value.trim().parse().map_err(|_| bad_value())?;
            }
            "MaxIterations" => {
                self.max_iters = value.trim().parse().map_err(|_| bad_value())?;
            }
            "GMRESRestart" => {
                self.restart = value.trim().parse().map_err(|_| bad_value())?;
            }
            _ => {
                return Err(LinSysError::Configuration(format!(
                    "unknown solver option '{name}'"
                )));
            }
        }
        Ok(())
    }

    /// Check the numeric options.
    pub fn validate(&self) -> Result<(), LinSysError> {
        if !(self.tol > 0.0 && self.tol.is_finite()) {
            return Err(LinSysError::Configuration(format!(
                "iterative tolerance must be positive, got {}",
                self.tol
            )));
        }
        if self.kind.is_iterative() && (self.max_iters == 0 || self.restart == 0) {
            return Err(LinSysError::Configuration(
                "iterative solves need a positive iteration limit and restart length".into(),
            ));
        }
        Ok(())
    }
}

impl FromStr for SolverOptions {
    type Err = LinSysError;

    /// Parse `name=value` pairs separated by whitespace, commas or semicolons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut opts = SolverOptions::default();
        for pair in s
            .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .filter(|p| !p.is_empty())
        {
            let (name, value) = pair.split_once('=').ok_or_else(|| {
                LinSysError::Configuration(format!("expected name=value, got '{pair}'"))
            })?;
            opts.set(name.trim(), value)?;
        }
        opts.validate()?;
        Ok(opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_style_options() {
        let opts: SolverOptions =
            "GlobalSysSoln=IterativeStaticCond Preconditioner=Null LinSysIterSolver=GMRES \
             IterativeSolverTolerance=1e-6 MaxIterations=200"
                .parse()
                .unwrap();
        assert_eq!(opts.kind, GlobalLinSysKind::IterativeStaticCond);
        assert_eq!(opts.preconditioner, PreconditionerKind::Null);
        assert_eq!(opts.krylov, Some(KrylovMethod::Gmres));
        assert_eq!(opts.tol, 1e-6);
        assert_eq!(opts.max_iters, 200);
    }

    #[test]
    fn rejects_unknown_names_and_bad_values() {
        assert!("GlobalSysSoln=Multigrid".parse::<SolverOptions>().is_err());
        assert!("Colour=blue".parse::<SolverOptions>().is_err());
        assert!("MaxIterations=lots".parse::<SolverOptions>().is_err());
        assert!("IterativeSolverTolerance=-1".parse::<SolverOptions>().is_err());
    }

    #[test]
    fn kind_names_are_case_insensitive() {
        assert_eq!(
            "directstaticcond".parse::<GlobalLinSysKind>().unwrap(),
            GlobalLinSysKind::DirectStaticCond
        );
        assert!(GlobalLinSysKind::IterativeFull.is_iterative());
        assert!(!GlobalLinSysKind::IterativeFull.is_static_cond());
    }
}
