//! Matmul command implementation.
//!
//! Three `M x M` int matrices live in bump-allocated memory. Each iteration
//! runs `C = A*B; B = C*A; A = B*C` through call sites, and the result is
//! checked against the same computation on plain vectors. Arithmetic wraps.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};
use vmem::address::ELEMENT_SIZE;
use vmem::{
    Address, AddressSpace, GetSite, PageKind, SetSite, VmemConfig, VmemError, PAGE_SIZE,
};

use crate::alloc::{BumpAllocator, PagePolicy};
use crate::error::{Result, VmemtError};

/// Default matrix dimension.
pub const DEFAULT_SIZE: usize = 30;

/// Default number of iterations.
pub const DEFAULT_ITERATIONS: usize = 100;

/// Arguments for the matmul command.
#[derive(Debug, Clone)]
pub struct MatmulArgs {
    pub config: VmemConfig,
    /// Matrix dimension.
    pub size: usize,
    /// Rounds of three multiplications.
    pub iterations: usize,
    /// Seed for the input matrices; random when absent.
    pub seed: Option<u64>,
    /// Print the final C matrix.
    pub print: bool,
    /// Put consecutive matrices on pages of alternating kinds.
    pub mixed: bool,
}

impl Default for MatmulArgs {
    fn default() -> Self {
        Self {
            config: VmemConfig::default(),
            size: DEFAULT_SIZE,
            iterations: DEFAULT_ITERATIONS,
            seed: None,
            print: false,
            mixed: false,
        }
    }
}

/// Outcome of a verified run.
#[derive(Debug, Clone, Serialize)]
pub struct MatmulReport {
    pub size: usize,
    pub iterations: usize,
    pub seed: u64,
    pub elapsed_ms: f64,
    pub relinks: u64,
    pub pages: usize,
    pub matrices: [Address; 3],
    pub checksum: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<Vec<i32>>>,
}

/// Row-major matrix in the address space.
#[derive(Debug, Clone, Copy)]
struct Matrix {
    base: Address,
    m: usize,
}

impl Matrix {
    fn at(&self, row: usize, col: usize) -> Address {
        self.base + ((row * self.m + col) * ELEMENT_SIZE) as Address
    }
}

/// Call sites used by the hot loop.
struct Sites {
    left: GetSite,
    right: GetSite,
    store: SetSite,
}

impl Sites {
    fn new() -> Result<Self> {
        Ok(Self {
            left: GetSite::new("GET:ELEMENT:memory")?,
            right: GetSite::new("GET:ELEMENT:memory")?,
            store: SetSite::new("SET:ELEMENT:memory")?,
        })
    }

    fn relinks(&self) -> u64 {
        self.left.relink_count() + self.right.relink_count() + self.store.relink_count()
    }

    /// `out = x * y`
    fn mul(&mut self, space: &AddressSpace, x: Matrix, y: Matrix, out: Matrix) -> Result<()> {
        let m = x.m;
        for i in 0..m {
            for j in 0..m {
                let mut sum = 0i32;
                for k in 0..m {
                    let a = self.left.get(space, x.at(i, k))?;
                    let b = self.right.get(space, y.at(k, j))?;
                    sum = sum.wrapping_add(a.wrapping_mul(b));
                }
                self.store.set(space, out.at(i, j), sum)?;
            }
        }
        Ok(())
    }
}

fn mul_baseline(x: &[i32], y: &[i32], out: &mut [i32], m: usize) {
    for i in 0..m {
        for j in 0..m {
            let mut sum = 0i32;
            for k in 0..m {
                sum = sum.wrapping_add(x[i * m + k].wrapping_mul(y[k * m + j]));
            }
            out[i * m + j] = sum;
        }
    }
}

/// Bytes of one `m x m` matrix, rejected if it cannot fit one page
fn matrix_bytes(m: usize) -> Result<usize> {
    match m.checked_mul(m).and_then(|n| n.checked_mul(ELEMENT_SIZE)) {
        Some(bytes) if bytes <= PAGE_SIZE => Ok(bytes),
        bytes => Err(VmemError::AllocationTooLarge {
            requested: bytes.unwrap_or(usize::MAX),
            capacity: PAGE_SIZE,
        }
        .into()),
    }
}

fn fill(space: &AddressSpace, matrix: Matrix, values: &[i32]) -> Result<()> {
    let mut set = SetSite::new("SET:ELEMENT:memory")?;
    for (n, value) in values.iter().enumerate() {
        set.set(space, matrix.at(n / matrix.m, n % matrix.m), *value)?;
    }
    Ok(())
}

fn read(space: &AddressSpace, matrix: Matrix) -> Result<Vec<i32>> {
    let mut get = GetSite::new("GET:ELEMENT:memory")?;
    let mut out = Vec::with_capacity(matrix.m * matrix.m);
    for i in 0..matrix.m {
        for j in 0..matrix.m {
            out.push(get.get(space, matrix.at(i, j))?);
        }
    }
    Ok(out)
}

/// Execute the matmul command.
pub fn run_matmul(args: MatmulArgs) -> Result<MatmulReport> {
    let m = args.size;
    if m == 0 {
        return Err(VmemtError::Validation("size must be > 0".to_string()));
    }
    let bytes = matrix_bytes(m)?;

    let space = AddressSpace::new(args.config)?;
    let policy = if args.mixed {
        PagePolicy::Alternate(space.config().default_page_kind)
    } else {
        PagePolicy::Default
    };
    let mut alloc = BumpAllocator::new(policy);
    let a = Matrix {
        base: alloc.malloc(&space, bytes)?,
        m,
    };
    let b = Matrix {
        base: alloc.malloc(&space, bytes)?,
        m,
    };
    let c = Matrix {
        base: alloc.malloc(&space, bytes)?,
        m,
    };
    debug!(
        "a = {:#010x}, b = {:#010x}, c = {:#010x}",
        a.base, b.base, c.base
    );

    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut rng = StdRng::seed_from_u64(seed);
    let mut base_a: Vec<i32> = (0..m * m).map(|_| rng.gen()).collect();
    let mut base_b: Vec<i32> = (0..m * m).map(|_| rng.gen()).collect();
    let mut base_c = vec![0i32; m * m];
    fill(&space, a, &base_a)?;
    fill(&space, b, &base_b)?;

    let mut sites = Sites::new()?;
    let start = Instant::now();
    for _ in 0..args.iterations {
        sites.mul(&space, a, b, c)?;
        sites.mul(&space, c, a, b)?;
        sites.mul(&space, b, c, a)?;
    }
    let elapsed = start.elapsed();

    for _ in 0..args.iterations {
        mul_baseline(&base_a, &base_b, &mut base_c, m);
        mul_baseline(&base_c, &base_a, &mut base_b, m);
        mul_baseline(&base_b, &base_c, &mut base_a, m);
    }

    for (name, matrix, expected) in [("A", a, &base_a), ("B", b, &base_b), ("C", c, &base_c)] {
        let actual = read(&space, matrix)?;
        if let Some(n) = actual.iter().zip(expected.iter()).position(|(x, y)| x != y) {
            return Err(VmemtError::Verification(format!(
                "{}[{}][{}] is {}, baseline has {}",
                name,
                n / m,
                n % m,
                actual[n],
                expected[n]
            )));
        }
    }

    let checksum: i64 = base_c.iter().map(|v| *v as i64).sum();
    let result: Option<Vec<Vec<i32>>> = args
        .print
        .then(|| base_c.chunks(m).map(|row| row.to_vec()).collect());

    let kinds: Vec<PageKind> = space.current_snapshot().kinds().to_vec();
    let report = MatmulReport {
        size: m,
        iterations: args.iterations,
        seed,
        elapsed_ms: elapsed.as_secs_f64() * 1000.0,
        relinks: sites.relinks(),
        pages: kinds.len(),
        matrices: [a.base, b.base, c.base],
        checksum,
        result,
    };
    info!(
        "matmul {}x{} x{} verified in {:.3} ms ({} relinks, pages {:?})",
        m, m, report.iterations, report.elapsed_ms, report.relinks, kinds
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(mixed: bool) -> MatmulArgs {
        MatmulArgs {
            size: 8,
            iterations: 3,
            seed: Some(9),
            mixed,
            ..Default::default()
        }
    }

    #[test]
    fn test_matmul_verifies() {
        let report = run_matmul(small(false)).unwrap();
        assert_eq!(report.size, 8);
        // 3 * 8 * 8 * 4 bytes fit one page
        assert_eq!(report.pages, 1);
        assert_eq!(report.relinks, 0);
        assert!(report.result.is_none());
    }

    #[test]
    fn test_matmul_mixed_relinks() {
        let report = run_matmul(MatmulArgs {
            size: 30,
            iterations: 1,
            seed: Some(3),
            mixed: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(report.pages, 3);
        assert!(report.relinks > 0);
    }

    #[test]
    fn test_matmul_print_matches_checksum() {
        let report = run_matmul(MatmulArgs {
            print: true,
            ..small(false)
        })
        .unwrap();
        let rows = report.result.unwrap();
        assert_eq!(rows.len(), 8);
        let sum: i64 = rows.iter().flatten().map(|v| *v as i64).sum();
        assert_eq!(sum, report.checksum);
    }

    #[test]
    fn test_matmul_rejects_bad_sizes() {
        let err = run_matmul(MatmulArgs {
            size: 0,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, VmemtError::Validation(_)));

        let err = run_matmul(MatmulArgs {
            size: 33,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            VmemtError::Vmem(VmemError::AllocationTooLarge { .. })
        ));
    }

    #[test]
    fn test_matmul_rejects_overflowing_size() {
        let err = run_matmul(MatmulArgs {
            size: 1 << 31,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            VmemtError::Vmem(VmemError::AllocationTooLarge {
                capacity: PAGE_SIZE,
                ..
            })
        ));

        let err = run_matmul(MatmulArgs {
            size: usize::MAX,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            VmemtError::Vmem(VmemError::AllocationTooLarge {
                requested: usize::MAX,
                ..
            })
        ));
    }

    #[test]
    fn test_matrix_bytes_limit() {
        assert_eq!(matrix_bytes(32).unwrap(), PAGE_SIZE);
        assert!(matrix_bytes(33).is_err());
    }

    #[test]
    fn test_baseline_identity() {
        let identity = vec![1, 0, 0, 1];
        let x = vec![3, 4, 5, 6];
        let mut out = vec![0; 4];
        mul_baseline(&x, &identity, &mut out, 2);
        assert_eq!(out, x);
    }
}
