//! Built-in pool layouts for x86 CPU models.
//!
//! `default_x86` is the stock pool shared by the simple and O3 models.
//! `xeon_exec_units` is the eight-port Xeon layout, and `xeon_o3` applies
//! the O3 model's latency and replica overrides on top of it.

use crate::builder::FuPoolBuilder;
use crate::desc::{CoreConfig, FuDesc, FuPoolConfig, OpDesc, SchedulerParams};
use crate::op_class::OpClass::{self, *};

/// Index of each Xeon port in [`xeon_exec_units`].
pub mod xeon_port {
    pub const PORT0: usize = 0;
    pub const PORT1: usize = 1;
    pub const PORT2: usize = 2;
    pub const PORT3: usize = 3;
    pub const PORT4: usize = 4;
    pub const PORT5: usize = 5;
    pub const PORT6: usize = 6;
    pub const PORT7: usize = 7;
}

fn ops(unit: FuDesc, list: impl IntoIterator<Item = OpDesc>) -> FuDesc {
    list.into_iter().fold(unit, FuDesc::op)
}

fn single_cycle(classes: &[OpClass]) -> Vec<OpDesc> {
    classes.iter().map(|&c| OpDesc::new(c)).collect()
}

fn lat(class: OpClass, latency: u32) -> OpDesc {
    OpDesc::new(class).latency(latency)
}

/// The stock x86 pool.
///
/// Integer divide is modelled as a loop of single-bit divide micro-ops,
/// so `IntDiv` is one cycle but not pipelined.
pub fn default_x86() -> FuPoolConfig {
    let simd = [
        SimdAdd, SimdAddAcc, SimdAlu, SimdCmp, SimdCvt, SimdMisc, SimdMult, SimdMultAcc,
        SimdMatMultAcc, SimdShift, SimdShiftAcc, SimdDiv, SimdSqrt, SimdFloatAdd, SimdFloatAlu,
        SimdFloatCmp, SimdFloatCvt, SimdFloatDiv, SimdFloatMisc, SimdFloatMult, SimdFloatMultAcc,
        SimdFloatMatMultAcc, SimdFloatSqrt, SimdReduceAdd, SimdReduceAlu, SimdReduceCmp,
        SimdFloatReduceAdd, SimdFloatReduceCmp, SimdAes, SimdAesMix, SimdSha1Hash, SimdSha1Hash2,
        SimdSha256Hash, SimdSha256Hash2, SimdShaSigma2, SimdShaSigma3,
    ];

    FuPoolConfig {
        name: "DefaultX86FUPool".into(),
        units: vec![
            ops(FuDesc::new("IntALU", 6), single_cycle(&[IntAlu])),
            ops(
                FuDesc::new("X86IntMultDiv", 2),
                [lat(IntMult, 3), OpDesc::new(IntDiv).unpipelined()],
            ),
            ops(
                FuDesc::new("FP_ALU", 4),
                [lat(FloatAdd, 2), lat(FloatCmp, 2), lat(FloatCvt, 2)],
            ),
            ops(
                FuDesc::new("FP_MultDiv", 2),
                [
                    lat(FloatMult, 4),
                    lat(FloatMultAcc, 5),
                    lat(FloatMisc, 3),
                    lat(FloatDiv, 12).unpipelined(),
                    lat(FloatSqrt, 24).unpipelined(),
                ],
            ),
            ops(FuDesc::new("ReadPort", 0), single_cycle(&[MemRead, FloatMemRead])),
            ops(FuDesc::new("SIMD_Unit", 4), single_cycle(&simd)),
            ops(FuDesc::new("PredALU", 1), single_cycle(&[SimdPredAlu])),
            ops(FuDesc::new("WritePort", 0), single_cycle(&[MemWrite, FloatMemWrite])),
            ops(
                FuDesc::new("RdWrPort", 4),
                single_cycle(&[MemRead, MemWrite, FloatMemRead, FloatMemWrite]),
            ),
            ops(
                FuDesc::new("IprPort", 1),
                [lat(IprAccess, 3).unpipelined()],
            ),
        ],
    }
}

// Vector entries ports 0, 1 and 5 share, in their declared order.
fn short_simd() -> Vec<OpDesc> {
    single_cycle(&[
        SimdAdd, SimdAddAcc, SimdAlu, SimdCmp, SimdShift, SimdShiftAcc, SimdReduceAdd,
        SimdReduceAlu, SimdReduceCmp,
    ])
}

fn float_pipe() -> Vec<OpDesc> {
    vec![
        lat(FloatAdd, 4),
        lat(FloatCmp, 4),
        lat(FloatCvt, 4),
        lat(FloatMult, 4),
        lat(FloatMultAcc, 5),
    ]
}

fn simd_float_pipe(classes: &[OpClass]) -> Vec<OpDesc> {
    classes.iter().map(|&c| lat(c, 4)).collect()
}

fn vector_port(name: &str, head: Vec<OpDesc>, tail: Vec<OpDesc>) -> FuDesc {
    let mut unit = ops(FuDesc::new(name, 1), head);
    unit = ops(unit, float_pipe());
    unit = ops(unit, short_simd());
    unit = ops(
        unit,
        [
            lat(SimdCvt, 3),
            OpDesc::new(SimdMisc),
            lat(SimdMult, 4),
            lat(SimdMultAcc, 4),
        ],
    );
    unit = ops(
        unit,
        simd_float_pipe(&[
            SimdFloatAdd,
            SimdFloatAlu,
            SimdFloatCmp,
            SimdFloatReduceAdd,
            SimdFloatReduceCmp,
            SimdFloatCvt,
            SimdFloatMult,
            SimdFloatMultAcc,
        ]),
    );
    ops(unit, tail)
}

/// The eight-port Xeon execution layout, one replica per port.
///
/// Ports 0, 1, 5 and 6 carry integer ALUs; 2 and 3 are load ports;
/// 4 and 7 are store ports.
pub fn xeon_exec_units() -> FuPoolConfig {
    let port0 = vector_port(
        "port0",
        vec![OpDesc::new(IntAlu), OpDesc::new(IntDiv), lat(FloatDiv, 12), lat(FloatSqrt, 24)],
        vec![lat(SimdFloatDiv, 12), lat(SimdFloatSqrt, 20)],
    );
    let port1 = vector_port("port1", vec![OpDesc::new(IntAlu), lat(IntMult, 3)], vec![]);

    let load = |name: &str| ops(FuDesc::new(name, 1), single_cycle(&[MemRead, FloatMemRead]));
    let store = |name: &str| ops(FuDesc::new(name, 1), single_cycle(&[MemWrite, FloatMemWrite]));

    let mut port5 = ops(
        FuDesc::new("port5", 1),
        single_cycle(&[
            IntAlu, SimdAdd, SimdAddAcc, SimdAlu, SimdCmp, SimdShift, SimdMisc, SimdShiftAcc,
            SimdReduceAdd, SimdReduceAlu, SimdReduceCmp,
        ]),
    );
    port5 = ops(
        port5,
        simd_float_pipe(&[
            SimdFloatAdd,
            SimdFloatAlu,
            SimdFloatCmp,
            SimdFloatReduceAdd,
            SimdFloatReduceCmp,
        ]),
    );

    let port6 = ops(
        FuDesc::new("port6", 1),
        single_cycle(&[IntAlu, SimdAdd, SimdAddAcc, SimdAlu, SimdCmp, SimdShift, SimdShiftAcc]),
    );

    FuPoolConfig {
        name: "XeonExecUnits".into(),
        units: vec![
            port0,
            port1,
            load("port2"),
            load("port3"),
            store("port4"),
            port5,
            port6,
            store("port7"),
        ],
    }
}

/// The Xeon O3 model: Xeon ports with its latency and replica overrides.
pub fn xeon_o3() -> CoreConfig {
    use xeon_port::*;

    let mut builder = FuPoolBuilder::from_config(xeon_exec_units());
    builder.name("XeonExecUnits-O3");
    let fu_pool = builder
        .set_op_latency(PORT0, IntDiv, 2)
        .and_then(|b| b.set_op_latency(PORT1, IntMult, 2))
        .and_then(|b| b.set_count(PORT2, 12))
        .and_then(|b| b.set_count(PORT4, 12))
        .and_then(|b| b.set_count(PORT6, 3))
        .and_then(|b| b.build())
        .unwrap_or_else(|e| panic!("built-in Xeon O3 overrides are invalid: {e}"));

    // width = 4, issueWidth = 2 * width
    CoreConfig {
        name: "X86O3CPU-Xeon".into(),
        scheduler: SchedulerParams {
            issue_width: 8,
            iq_entries: 146,
        },
        fu_pool,
    }
}

/// The stock O3 model over [`default_x86`].
pub fn default_x86_o3() -> CoreConfig {
    CoreConfig {
        name: "X86O3CPU".into(),
        scheduler: SchedulerParams::default(),
        fu_pool: default_x86(),
    }
}
