mod common;

use common::{add_room, assert_consistent, create_store, exec, register, snapshot};
use hostel::{
	allocation::{allocate_auto, allocate_explicit},
	inventory,
	types::{Allocation, AllocationForm, AutoAllocationForm},
	HostelError,
};

fn explicit(usn: &str, room_no: &str, bed_no: i64) -> AllocationForm {
	AllocationForm {
		usn: usn.to_string(),
		room_no: room_no.to_string(),
		bed_no,
	}
}

fn auto(usn: &str) -> AutoAllocationForm {
	AutoAllocationForm { usn: usn.to_string() }
}

#[tokio::test]
async fn explicit_allocation_then_conflict_on_same_bed() {
	let (store, _dir) = create_store().await;
	add_room(&store, "R1", 3).await;
	register(&store, "S1").await;
	register(&store, "S2").await;

	let beds = inventory::beds(&store, "R1").await.unwrap();
	assert_eq!(beds.iter().map(|b| b.bed_no).collect::<Vec<_>>(), vec![1, 2, 3]);
	assert!(beds.iter().all(|b| b.occupied_by.is_none()));
	assert_eq!(inventory::room(&store, "R1").await.unwrap().no_of_occupancy, 0);

	let allocation = allocate_explicit(&store, explicit("S1", "R1", 2)).await.unwrap();
	assert_eq!(
		allocation,
		Allocation {
			usn: "S1".to_string(),
			room_no: "R1".to_string(),
			bed_no: 2,
		}
	);
	assert_eq!(inventory::room(&store, "R1").await.unwrap().no_of_occupancy, 1);
	let beds = inventory::beds(&store, "R1").await.unwrap();
	assert_eq!(beds[1].occupied_by.as_deref(), Some("S1"));
	assert_consistent(&store).await;

	let before = snapshot(&store).await;
	let err = allocate_explicit(&store, explicit("S2", "R1", 2)).await.unwrap_err();
	assert!(matches!(err, HostelError::Conflict(_)), "got {err:?}");
	assert_eq!(snapshot(&store).await, before);
	assert_consistent(&store).await;
}

#[tokio::test]
async fn allocated_student_cannot_take_a_second_bed() {
	let (store, _dir) = create_store().await;
	add_room(&store, "R1", 2).await;
	register(&store, "S1").await;

	allocate_explicit(&store, explicit("S1", "R1", 1)).await.unwrap();
	let before = snapshot(&store).await;

	let err = allocate_explicit(&store, explicit("S1", "R1", 2)).await.unwrap_err();
	assert!(matches!(err, HostelError::Conflict(_)), "got {err:?}");
	let err = allocate_auto(&store, auto("S1")).await.unwrap_err();
	assert!(matches!(err, HostelError::Conflict(_)), "got {err:?}");

	assert_eq!(snapshot(&store).await, before);
}

#[tokio::test]
async fn missing_references_are_not_found() {
	let (store, _dir) = create_store().await;
	add_room(&store, "R1", 2).await;
	register(&store, "S1").await;
	let before = snapshot(&store).await;

	let err = allocate_explicit(&store, explicit("NOPE", "R1", 1)).await.unwrap_err();
	assert!(matches!(err, HostelError::NotFound(_)), "got {err:?}");

	let err = allocate_explicit(&store, explicit("S1", "R9", 1)).await.unwrap_err();
	assert!(matches!(err, HostelError::NotFound(_)), "got {err:?}");

	let err = allocate_explicit(&store, explicit("S1", "R1", 7)).await.unwrap_err();
	assert!(matches!(err, HostelError::NotFound(_)), "got {err:?}");

	let err = allocate_auto(&store, auto("NOPE")).await.unwrap_err();
	assert!(matches!(err, HostelError::NotFound(_)), "got {err:?}");

	assert_eq!(snapshot(&store).await, before);
}

#[tokio::test]
async fn auto_allocation_without_vacancy_is_capacity() {
	let (store, _dir) = create_store().await;
	add_room(&store, "R1", 1).await;
	register(&store, "S1").await;
	register(&store, "S2").await;
	allocate_auto(&store, auto("S1")).await.unwrap();

	let before = snapshot(&store).await;
	let err = allocate_auto(&store, auto("S2")).await.unwrap_err();
	assert!(matches!(err, HostelError::Capacity), "got {err:?}");
	assert_eq!(snapshot(&store).await, before);
}

#[tokio::test]
async fn auto_allocation_with_no_rooms_is_capacity() {
	let (store, _dir) = create_store().await;
	register(&store, "S1").await;

	let err = allocate_auto(&store, auto("S1")).await.unwrap_err();
	assert!(matches!(err, HostelError::Capacity), "got {err:?}");
	assert_consistent(&store).await;
}

#[tokio::test]
async fn auto_allocation_picks_lowest_room_then_bed() {
	let (store, _dir) = create_store().await;
	add_room(&store, "R2", 2).await;
	add_room(&store, "R1", 2).await;
	register(&store, "F1").await;
	register(&store, "F2").await;
	register(&store, "S1").await;
	register(&store, "S2").await;

	// leave (R1,1) and (R2,1) as the only vacancies
	allocate_explicit(&store, explicit("F1", "R1", 2)).await.unwrap();
	allocate_explicit(&store, explicit("F2", "R2", 2)).await.unwrap();

	let first = allocate_auto(&store, auto("S1")).await.unwrap();
	assert_eq!((first.room_no.as_str(), first.bed_no), ("R1", 1));

	let second = allocate_auto(&store, auto("S2")).await.unwrap();
	assert_eq!((second.room_no.as_str(), second.bed_no), ("R2", 1));

	assert_consistent(&store).await;
}

#[tokio::test]
async fn auto_allocation_is_deterministic_for_equal_state() {
	let mut picks = Vec::new();
	for _ in 0..3 {
		let (store, _dir) = create_store().await;
		add_room(&store, "R2", 1).await;
		add_room(&store, "R1", 1).await;
		register(&store, "S1").await;
		picks.push(allocate_auto(&store, auto("S1")).await.unwrap());
	}
	assert!(picks.windows(2).all(|w| w[0] == w[1]));
	assert_eq!(picks[0].room_no, "R1");
}

#[tokio::test]
async fn explicit_allocation_rolls_back_on_fault_after_first_write() {
	let (store, _dir) = create_store().await;
	add_room(&store, "R1", 2).await;
	register(&store, "S1").await;

	exec(
		&store,
		"CREATE TRIGGER fail_occupancy BEFORE UPDATE ON room
		BEGIN SELECT RAISE(ABORT, 'simulated fault'); END",
	)
	.await;

	let before = snapshot(&store).await;
	assert!(allocate_explicit(&store, explicit("S1", "R1", 1)).await.is_err());
	assert_eq!(snapshot(&store).await, before);
	assert_consistent(&store).await;
}

#[tokio::test]
async fn explicit_allocation_rolls_back_on_fault_at_last_write() {
	let (store, _dir) = create_store().await;
	add_room(&store, "R1", 2).await;
	register(&store, "S1").await;

	exec(
		&store,
		"CREATE TRIGGER fail_bed BEFORE UPDATE ON bed
		BEGIN SELECT RAISE(ABORT, 'simulated fault'); END",
	)
	.await;

	let before = snapshot(&store).await;
	let err = allocate_explicit(&store, explicit("S1", "R1", 1)).await.unwrap_err();
	assert!(!matches!(err, HostelError::Conflict(_) | HostelError::NotFound(_)));
	assert_eq!(snapshot(&store).await, before);
	assert_consistent(&store).await;
}

#[tokio::test]
async fn auto_allocation_rolls_back_on_fault() {
	let (store, _dir) = create_store().await;
	add_room(&store, "R1", 2).await;
	register(&store, "S1").await;

	exec(
		&store,
		"CREATE TRIGGER fail_status BEFORE UPDATE ON student
		WHEN NEW.usn = 'S1'
		BEGIN SELECT RAISE(ABORT, 'simulated fault'); END",
	)
	.await;

	let before = snapshot(&store).await;
	assert!(allocate_auto(&store, auto("S1")).await.is_err());
	assert_eq!(snapshot(&store).await, before);
	assert_consistent(&store).await;

	exec(&store, "DROP TRIGGER fail_status").await;
	let allocation = allocate_auto(&store, auto("S1")).await.unwrap();
	assert_eq!((allocation.room_no.as_str(), allocation.bed_no), ("R1", 1));
	assert_consistent(&store).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_on_one_bed_allow_a_single_winner() {
	let (store, _dir) = create_store().await;
	add_room(&store, "R1", 2).await;
	let contenders = ["C1", "C2", "C3", "C4"];
	for usn in contenders {
		register(&store, usn).await;
	}

	let tasks: Vec<_> = contenders
		.iter()
		.map(|usn| {
			let store = store.clone();
			let form = explicit(usn, "R1", 1);
			tokio::spawn(async move { allocate_explicit(&store, form).await })
		})
		.collect();

	let mut winners = Vec::new();
	for task in tasks {
		match task.await.unwrap() {
			Ok(allocation) => winners.push(allocation.usn),
			Err(err) => assert!(matches!(err, HostelError::Conflict(_)), "got {err:?}"),
		}
	}

	assert_eq!(winners.len(), 1);
	let beds = inventory::beds(&store, "R1").await.unwrap();
	assert_eq!(beds[0].occupied_by, winners.first().cloned());
	assert_eq!(beds[1].occupied_by, None);
	assert_consistent(&store).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_allocations_to_different_beds_all_succeed() {
	let (store, _dir) = create_store().await;
	add_room(&store, "R1", 8).await;
	let students: Vec<String> = (1..=8).map(|i| format!("S{i}")).collect();
	for usn in &students {
		register(&store, usn).await;
	}

	let tasks: Vec<_> = students
		.iter()
		.zip(1..)
		.map(|(usn, bed_no)| {
			let store = store.clone();
			let form = explicit(usn, "R1", bed_no);
			tokio::spawn(async move { allocate_explicit(&store, form).await })
		})
		.collect();

	let mut failures = Vec::new();
	for task in tasks {
		if let Err(err) = task.await.unwrap() {
			failures.push(format!("{err:?}"));
		}
	}

	assert!(failures.is_empty(), "refused: {failures:?}");
	let room = inventory::room(&store, "R1").await.unwrap();
	assert_eq!(room.no_of_occupancy, 8);
	assert_consistent(&store).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_auto_allocation_fills_exactly_the_free_beds() {
	let (store, _dir) = create_store().await;
	add_room(&store, "R1", 2).await;
	let students = ["A1", "A2", "A3", "A4", "A5"];
	for usn in students {
		register(&store, usn).await;
	}

	let tasks: Vec<_> = students
		.iter()
		.map(|usn| {
			let store = store.clone();
			let form = auto(usn);
			tokio::spawn(async move { allocate_auto(&store, form).await })
		})
		.collect();

	let mut placed = 0;
	for task in tasks {
		match task.await.unwrap() {
			Ok(_) => placed += 1,
			Err(err) => assert!(matches!(err, HostelError::Capacity), "got {err:?}"),
		}
	}

	assert_eq!(placed, 2);
	let room = inventory::room(&store, "R1").await.unwrap();
	assert_eq!(room.no_of_occupancy, placed);
	assert_consistent(&store).await;
}
