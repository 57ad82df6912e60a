//! Benchmarks the full flight control tick under the position cascade.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use comms_if::eqpt::phys::{BodyProps, RigidBodyState};
use comms_if::tc::flight_ctrl::Twist;
use fc_lib::flight_ctrl::{
    CascadePolicy, EngageCmd, FlightCtrl, InputData, Params, PidConfig};
use util::module::State;

fn input_at(time: f64) -> InputData {
    InputData {
        sim_time_s: time,
        body: Some(RigidBodyState {
            link_name: "base_link".into(),
            position_m: [0.1, -0.2, 1.5],
            attitude_q: [0.99, 0.01, -0.02, 0.1],
            lin_vel_ms: [0.2, 0.1, -0.05],
            ang_vel_rads: [0.01, 0.02, -0.01],
            ang_acc_radss: [0.0; 3],
            sim_time_s: time
        }),
        odom: None,
        imu: None
    }
}

fn bench_control_tick(c: &mut Criterion) {
    let mut params = Params::default();
    params.policy = CascadePolicy::PositionCascade;
    params.auto_engage = false;

    let gains = PidConfig {
        gain_p: 5.0,
        gain_d: 1.0,
        gain_i: 1.0,
        time_constant: 0.05,
        limit: 10.0
    };
    params.velocity_x = gains;
    params.velocity_y = gains;
    params.velocity_z = gains;
    params.position_x = gains;
    params.position_y = gains;
    params.position_z = gains;
    params.roll = gains;
    params.pitch = gains;
    params.yaw = gains;
    params.roll_rate = gains;
    params.pitch_rate = gains;
    params.yaw_rate = gains;

    let mut fc = FlightCtrl::with_params(params);
    fc.set_body_props(&BodyProps {
        link_name: "base_link".into(),
        mass_kg: 1.5,
        principal_inertia_kgm2: [0.02, 0.02, 0.04],
        cog_m: [0.0, 0.0, -0.05]
    });

    fc.cmd_channel().post_engage(EngageCmd::Engage);
    fc.cmd_channel().post_position(Twist {
        linear: [1.0, 1.0, 2.0],
        angular: [0.0, 0.0, 0.5]
    });

    // Prime the decimator so every iteration below executes the control law
    fc.proc(&input_at(0.0)).unwrap();

    let mut time = 0.0;
    c.bench_function("control_tick", |b| {
        b.iter(|| {
            time += 0.02;
            black_box(fc.proc(&input_at(time)).unwrap())
        })
    });
}

criterion_group!(benches, bench_control_tick);
criterion_main!(benches);
