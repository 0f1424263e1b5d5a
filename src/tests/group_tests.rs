use super::{create_test_service, member};
use crate::config::CONFIG;
use crate::constants::{GROUP_CREATED, MEMBER_ADDED, MEMBER_REMOVED};
use crate::core::errors::LedgerError;
use crate::core::money::Currency;
use crate::core::services::LedgerService;

#[tokio::test]
async fn test_create_group_adds_creator_as_member() {
    let service = create_test_service();
    let alice = member("alice");

    let group = service
        .create_group("Trip".to_string(), Some("Goa, March".to_string()), None, &alice)
        .await
        .unwrap();

    assert_eq!(group.name, "Trip");
    assert_eq!(group.currency, Currency::Inr);
    assert_eq!(group.members.len(), 1);
    assert!(group.is_member(&alice));
    assert!(group.is_creator(&alice));

    let audits = service.get_group_audits(&group.id).await.unwrap();
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].action, GROUP_CREATED);
}

#[tokio::test]
async fn test_create_group_rejects_blank_name() {
    let service = create_test_service();
    let result = service.create_group("   ".to_string(), None, None, &member("alice")).await;
    assert!(matches!(result, Err(LedgerError::InvalidInput(field, _)) if field == "name"));
}

#[tokio::test]
async fn test_add_member_once() {
    let service = create_test_service();
    let alice = member("alice");
    let group = service
        .create_group("Flat".to_string(), None, Some(Currency::Gbp), &alice)
        .await
        .unwrap();

    let group = service.add_member(&group.id, member("bob"), &alice).await.unwrap();
    assert!(group.is_member(&member("bob")));

    let again = service.add_member(&group.id, member("bob"), &alice).await;
    assert!(matches!(again, Err(LedgerError::AlreadyGroupMember(id)) if id == "bob"));

    let logs = service.get_app_logs().await.unwrap();
    assert_eq!(logs.last().unwrap().action, MEMBER_ADDED);
}

#[tokio::test]
async fn test_outsider_cannot_add_members() {
    let service = create_test_service();
    let group = service
        .create_group("Flat".to_string(), None, None, &member("alice"))
        .await
        .unwrap();

    let result = service.add_member(&group.id, member("bob"), &member("mallory")).await;
    assert!(matches!(result, Err(LedgerError::NotGroupMember(id)) if id == "mallory"));
}

#[tokio::test]
async fn test_remove_member_rules() {
    let service = create_test_service();
    let alice = member("alice");
    let group = service
        .create_group("Flat".to_string(), None, None, &alice)
        .await
        .unwrap();
    service.add_member(&group.id, member("bob"), &alice).await.unwrap();
    service.add_member(&group.id, member("carol"), &alice).await.unwrap();

    // bob cannot remove carol, but can leave
    let result = service.remove_member(&group.id, &member("carol"), &member("bob")).await;
    assert!(matches!(result, Err(LedgerError::NotCreator(_))));
    let group = service.remove_member(&group.id, &member("bob"), &member("bob")).await.unwrap();
    assert!(!group.is_member(&member("bob")));

    // the creator stays
    let result = service.remove_member(&group.id, &alice, &alice).await;
    assert!(matches!(result, Err(LedgerError::InvalidGroupState(_))));

    let group = service.remove_member(&group.id, &member("carol"), &alice).await.unwrap();
    assert_eq!(group.members.len(), 1);
}

#[tokio::test]
async fn test_member_groups_lists_only_memberships() {
    let service = create_test_service();
    let alice = member("alice");
    let g1 = service.create_group("One".to_string(), None, None, &alice).await.unwrap();
    let _g2 = service.create_group("Two".to_string(), None, None, &member("bob")).await.unwrap();

    let groups = service.member_groups(&alice).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, g1.id);
}

#[tokio::test]
async fn test_delete_group_is_creator_only() {
    let service = create_test_service();
    let alice = member("alice");
    let group = service.create_group("Trip".to_string(), None, None, &alice).await.unwrap();
    service.add_member(&group.id, member("bob"), &alice).await.unwrap();

    let result = service.delete_group(&group.id, &member("bob")).await;
    assert!(matches!(result, Err(LedgerError::NotCreator(_))));

    service.delete_group(&group.id, &alice).await.unwrap();
    assert!(service.get_group(&group.id).await.unwrap().is_none());
    let missing = service.delete_group(&group.id, &alice).await;
    assert!(matches!(missing, Err(LedgerError::GroupNotFound(_))));
}

#[tokio::test]
async fn test_in_memory_service_uses_loaded_config() {
    let service = LedgerService::in_memory();
    let group = service
        .create_group("Office".to_string(), None, None, &member("alice"))
        .await
        .unwrap();
    assert_eq!(group.currency, CONFIG.default_currency);
}

#[tokio::test]
async fn test_member_activity_is_newest_first() {
    let service = create_test_service();
    let alice = member("alice");
    let group = service.create_group("Flat".to_string(), None, None, &alice).await.unwrap();
    service.add_member(&group.id, member("bob"), &alice).await.unwrap();
    service.remove_member(&group.id, &member("bob"), &member("bob")).await.unwrap();

    let actions: Vec<String> = service
        .member_activity(&alice)
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.action)
        .collect();
    assert_eq!(actions, vec![MEMBER_ADDED, GROUP_CREATED]);

    let bobs = service.member_activity(&member("bob")).await.unwrap();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].action, MEMBER_REMOVED);
    assert_eq!(bobs[0].member_id, Some(member("bob")));
}
