use attest::{
    data_row, run_console, values, Assert, AssertResultExt, DataRow, DynamicData, Exception,
    ExpectedException, Member, StringAssert, TestMethod, TestSuite, TypeInfo, TypeRegistry, Value,
};
use std::process::ExitCode;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("no planet at position {0}")]
struct NoSuchPlanet(i32);

const PLANETS: [&str; 8] = [
    "mercury", "venus", "earth", "mars", "jupiter", "saturn", "uranus", "neptune",
];

fn planet(position: i32) -> Result<&'static str, NoSuchPlanet> {
    usize::try_from(position - 1)
        .ok()
        .and_then(|i| PLANETS.get(i).copied())
        .ok_or(NoSuchPlanet(position))
}

fn orbits() -> Value {
    Value::Array(vec![
        Value::from(values![1, "mercury"]),
        Value::from(values![3, "earth"]),
        Value::from(values![8, "neptune"]),
    ])
}

fn check_position(args: &[Value]) -> Result<(), Exception> {
    let [Value::I32(position), Value::Str(name)] = args else {
        return Assert::fail("expected (i32, String)").map_err(Exception::from);
    };
    Assert::are_equal(name.as_str(), planet(*position)?)
        .with_formatted_message("position {0}", &values![*position])?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let registry = TypeRegistry::new().with_type(
        TypeInfo::new("PlanetTests")
            .with(Member::property("Orbits", orbits))
            .with(Member::naming_hook("OrbitName", |method, data| {
                format!("{} #{}", method.name, data.first().map(ToString::to_string).unwrap_or_default())
            })),
    );

    let suite = TestSuite::new(registry)
        .with_method(
            TestMethod::new("PlanetTests", "KnownPositions", check_position)
                .data_row(data_row![2, "venus"])
                .data_row(DataRow::new(values![4, "mars"]).with_display_name("The red planet")),
        )
        .with_method(
            TestMethod::new("PlanetTests", "Orbits", check_position)
                .dynamic_data(DynamicData::new("Orbits").with_display_name_hook("OrbitName")),
        )
        .with_method(
            TestMethod::new("PlanetTests", "NoNinthPlanet", |_| {
                planet(9)?;
                Ok(())
            })
            .expect_exception(ExpectedException::of::<NoSuchPlanet>()),
        )
        .with_method(TestMethod::new("PlanetTests", "GasGiants", |_| {
            StringAssert::ends_with("jupiter", "ter")?;
            Ok(())
        }))
        .with_method(
            TestMethod::new_async("PlanetTests", "Telescope", |_| async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok::<(), Exception>(())
            })
            .with_timeout(Duration::from_secs(1)),
        )
        .with_method(TestMethod::new("PlanetTests", "Pluto", |_| Ok(())).ignored("demoted in 2006"));

    run_console(suite).await
}
